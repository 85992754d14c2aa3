//! Utilities

// Modules
pub mod logger;

// Imports
use std::{cell::RefCell, fmt, io};

/// Extension trait for `R: io::BufRead` types to block until a line is entered
#[extend::ext(name = WaitForLine)]
pub impl<R: io::BufRead> R {
	/// Blocks until a whole line has been read, discarding it.
	///
	/// Returns `false` if the reader hit EOF before any byte was read.
	fn wait_for_line(&mut self) -> Result<bool, io::Error> {
		// Note: We read raw bytes so non-utf8 input can't fail the wait
		let mut line = vec![];
		let bytes_read = self.read_until(b'\n', &mut line)?;
		Ok(bytes_read != 0)
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

#[cfg(test)]
mod tests {
	use {super::*, std::io::Cursor};

	#[test]
	fn wait_for_line_consumes_one_line() {
		let mut input = Cursor::new(b"first\nsecond\n".to_vec());
		assert!(input.wait_for_line().unwrap());
		assert!(input.wait_for_line().unwrap());
		assert!(!input.wait_for_line().unwrap());
	}

	#[test]
	fn wait_for_line_accepts_unterminated_input() {
		let mut input = Cursor::new(vec![0xff, 0xfe]);
		assert!(input.wait_for_line().unwrap());
		assert!(!input.wait_for_line().unwrap());
	}

	#[test]
	fn display_wrapper_forwards_formatter() {
		let mut calls = 0;
		let wrapper = DisplayWrapper::new(|f| {
			calls += 1;
			write!(f, "0x{:x}", 255)
		});
		assert_eq!(wrapper.to_string(), "0xff");
		drop(wrapper);
		assert_eq!(calls, 1);
	}
}
