//! Workers

// Imports
use {
	crate::{pattern::AccessPattern, workspace::Workspace},
	anyhow::Context,
	std::{
		hint,
		ptr,
		sync::{
			atomic::{AtomicBool, Ordering},
			Arc,
		},
		thread,
	},
};

/// Stop flag.
///
/// Has exactly one writer, the orchestrator, and one reader, the worker,
/// so a release store paired with an acquire load is all that's needed.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
	/// Creates a new, lowered, stop flag
	pub fn new() -> Self {
		Self::default()
	}

	/// Raises this flag
	pub fn raise(&self) {
		self.0.store(true, Ordering::Release);
	}

	/// Returns if this flag was raised
	pub fn is_raised(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Worker
#[derive(Debug)]
pub struct Worker {
	/// Index
	idx: usize,

	/// Stop flag
	stop: StopFlag,

	/// Thread handle.
	///
	/// Only `None` after being joined
	handle: Option<thread::JoinHandle<WorkerOutput>>,
}

impl Worker {
	/// Spawns a worker bashing `workspace` with `pattern`.
	///
	/// # Errors
	/// Returns an error if unable to spawn the thread.
	pub fn spawn(
		idx: usize,
		workspace: Workspace,
		pattern: AccessPattern,
		batch_steps: usize,
	) -> Result<Self, anyhow::Error> {
		let stop = StopFlag::new();
		let handle = thread::Builder::new()
			.name(format!("basher-{idx}"))
			.spawn({
				let stop = stop.clone();
				move || self::bash(&workspace, pattern, batch_steps, &stop)
			})
			.with_context(|| format!("Unable to spawn worker {idx}"))?;
		tracing::debug!(idx, thread_id = ?handle.thread().id(), "Spawned worker");

		Ok(Self {
			idx,
			stop,
			handle: Some(handle),
		})
	}

	/// Returns this worker's index
	pub fn idx(&self) -> usize {
		self.idx
	}

	/// Signals this worker to stop after its current batch.
	///
	/// Doesn't wait for it to actually stop
	pub fn stop(&self) {
		self.stop.raise();
	}

	/// Waits for this worker to finish and returns its output.
	///
	/// # Errors
	/// Returns an error if the worker panicked.
	pub fn join(mut self) -> Result<WorkerOutput, anyhow::Error> {
		let idx = self.idx;
		let Some(handle) = self.handle.take() else {
			anyhow::bail!("Worker {idx} was already joined");
		};
		let output = handle
			.join()
			.map_err(|_| anyhow::anyhow!("Worker {idx} panicked"))?;
		tracing::debug!(idx, ?output, "Joined worker");

		Ok(output)
	}
}

// Note: Dropping a worker without joining it still stops its thread
impl Drop for Worker {
	fn drop(&mut self) {
		self.stop.raise();
	}
}

/// Output of a worker
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WorkerOutput {
	/// Batches completed
	pub iterations: u64,

	/// Sum of all bytes read.
	///
	/// Only exists so the reads aren't optimized away.
	pub useless: u64,
}

/// Reads `workspace` with `pattern` in batches of `batch_steps` until `stop` is raised.
///
/// Every batch restarts the pattern at step 0.
pub fn bash(workspace: &Workspace, pattern: AccessPattern, batch_steps: usize, stop: &StopFlag) -> WorkerOutput {
	let bytes = workspace.as_bytes();
	let mut iterations = 0;
	let mut useless = 0u64;

	while !stop.is_raised() {
		for offset in pattern.offsets(workspace.lines()).take(batch_steps) {
			// SAFETY: `offset` is bounds checked by the index, and a `u8` is always aligned.
			// Note: We simply want to avoid the read being elided
			let byte = unsafe { ptr::read_volatile(&bytes[offset]) };
			useless = useless.wrapping_add(u64::from(byte));
		}
		iterations += 1;
	}

	WorkerOutput {
		iterations,
		useless: hint::black_box(useless),
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		std::time::{Duration, Instant},
	};

	#[test]
	fn raised_flag_runs_no_batches() {
		let workspace = Workspace::new(8, 1).unwrap();
		let stop = StopFlag::new();
		stop.raise();

		let output = self::bash(&workspace, AccessPattern::default(), 16, &stop);
		assert_eq!(output, WorkerOutput {
			iterations: 0,
			useless:    0,
		});
	}

	#[test]
	fn accumulates_read_bytes() {
		let workspace = Workspace::new(8, 3).unwrap();
		let worker = Worker::spawn(0, workspace, AccessPattern::Strided { skip_lines: 1 }, 10).unwrap();
		thread::sleep(Duration::from_millis(20));
		worker.stop();

		let output = worker.join().unwrap();
		assert!(output.iterations > 0);
		assert_eq!(output.useless, output.iterations * 10 * 3);
	}

	#[test]
	fn stops_within_a_batch() {
		let workers = (0..3)
			.map(|idx| {
				let workspace = Workspace::new(64, 0).unwrap();
				Worker::spawn(idx, workspace, AccessPattern::Modulo, 1024).unwrap()
			})
			.collect::<Vec<_>>();
		thread::sleep(Duration::from_millis(10));

		for worker in &workers {
			worker.stop();
		}
		for (idx, worker) in workers.into_iter().enumerate() {
			assert_eq!(worker.idx(), idx);
			let output = worker.join().unwrap();
			assert_eq!(output.useless, 0);
		}
	}

	#[test]
	fn dropped_worker_stops() {
		let workspace = Workspace::new(8, 0).unwrap();
		let worker = Worker::spawn(0, workspace, AccessPattern::default(), 64).unwrap();
		let stop = worker.stop.clone();
		drop(worker);
		assert!(stop.is_raised());

		// Once the thread exits, it drops its own copy of the flag
		let start = Instant::now();
		while Arc::strong_count(&stop.0) > 1 {
			assert!(start.elapsed() < Duration::from_secs(10), "Worker kept running after being dropped");
			thread::sleep(Duration::from_millis(1));
		}
	}

	#[test]
	fn stop_flag_is_shared() {
		let stop = StopFlag::new();
		let reader = stop.clone();
		assert!(!reader.is_raised());
		stop.raise();
		assert!(reader.is_raised());
	}
}
