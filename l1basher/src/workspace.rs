//! Workspace

// Imports
use {
	anyhow::Context,
	std::{
		fmt,
		time::{SystemTime, UNIX_EPOCH},
	},
};

/// Cache line size, in bytes
pub const LINE_SIZE: usize = 64;

/// A single cache line
#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct CacheLine([u8; LINE_SIZE]);

// Note: `align` only accepts literals, so ensure it matches the line size.
const _: () = assert!(std::mem::size_of::<CacheLine>() == LINE_SIZE);
const _: () = assert!(std::mem::align_of::<CacheLine>() == LINE_SIZE);

/// Workspace.
///
/// A cache-line aligned region of memory exclusively read by a single worker.
pub struct Workspace {
	/// All lines
	lines: Vec<CacheLine>,
}

impl Workspace {
	/// Allocates a workspace of `lines` cache lines, with every byte set to `fill`.
	///
	/// # Errors
	/// Returns an error if `lines` is 0, or if unable to allocate the workspace.
	pub fn new(lines: usize, fill: u8) -> Result<Self, anyhow::Error> {
		anyhow::ensure!(lines > 0, "Workspace must have at least 1 line");
		let total_size = lines
			.checked_mul(LINE_SIZE)
			.with_context(|| format!("Workspace of {lines} lines overflows the address space"))?;

		let mut workspace = vec![];
		workspace
			.try_reserve_exact(lines)
			.with_context(|| format!("Unable to allocate workspace of {total_size} bytes"))?;
		workspace.resize(lines, CacheLine([fill; LINE_SIZE]));

		Ok(Self { lines: workspace })
	}

	/// Returns a fill byte derived from the current wall-clock time
	pub fn clock_fill_byte() -> u8 {
		// Note: Only the lowest byte matters, so a clock before the epoch just uses `0`
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |time| (time.as_secs() & 0xff) as u8)
	}

	/// Returns the number of lines in this workspace
	pub fn lines(&self) -> usize {
		self.lines.len()
	}

	/// Returns the size of this workspace, in bytes
	pub fn total_size(&self) -> usize {
		self.lines.len() * LINE_SIZE
	}

	/// Returns all bytes of this workspace
	pub fn as_bytes(&self) -> &[u8] {
		let ptr = self.lines.as_ptr().cast::<u8>();

		// SAFETY: `CacheLine` is `repr(C)` over a byte array with no padding,
		//         so all `total_size` bytes are initialized and part of the allocation.
		unsafe { std::slice::from_raw_parts(ptr, self.total_size()) }
	}

	/// Returns the address of the first byte
	pub fn base_ptr(&self) -> *const u8 {
		self.lines.as_ptr().cast()
	}
}

impl fmt::Debug for Workspace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Workspace")
			.field("base_ptr", &self.base_ptr())
			.field("lines", &self.lines())
			.finish_non_exhaustive()
	}
}
