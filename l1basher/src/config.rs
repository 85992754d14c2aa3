//! Configuration

// Imports
use {
	crate::{pattern::AccessPattern, workspace::LINE_SIZE},
	std::time::Duration,
};

/// Default number of lines.
///
/// Touches every cache line once in a 32 KiB 8-way cache.
pub const DEFAULT_LINES: usize = 64 * 8;

/// Default number of threads
pub const DEFAULT_THREADS: usize = 1;

/// Default number of pattern steps between checks of the stop flag
pub const DEFAULT_BATCH_STEPS: usize = 0x100000;

/// Configuration.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Config {
	/// Working set, in cache lines
	lines: usize,

	/// Access pattern
	pattern: AccessPattern,

	/// Run duration.
	///
	/// If `None`, runs until a line of input is read.
	duration: Option<Duration>,

	/// Number of workers
	threads: usize,

	/// Pattern steps per batch
	batch_steps: usize,

	/// Randomized access order (reserved)
	randomized: bool,

	/// Verbose output
	verbose: bool,

	/// Wait for a line of input before exiting
	wait_before_exit: bool,
}

impl Config {
	/// Creates and validates a configuration.
	///
	/// # Errors
	/// Returns an error if any of the options is out of range.
	pub fn new(builder: ConfigBuilder) -> Result<Self, anyhow::Error> {
		let ConfigBuilder {
			lines,
			pattern,
			duration,
			threads,
			batch_steps,
			randomized,
			verbose,
			wait_before_exit,
		} = builder;

		anyhow::ensure!(lines > 0, "Number of cache lines must be positive");
		anyhow::ensure!(
			lines.checked_mul(LINE_SIZE).is_some(),
			"Working set of {lines} cache lines is too large"
		);
		anyhow::ensure!(batch_steps > 0, "Batch steps must be positive");
		if let Some(duration) = duration {
			anyhow::ensure!(!duration.is_zero(), "Duration must be positive");
		}

		if let AccessPattern::Strided { skip_lines } = pattern {
			// Note: A skip of 0 is the plain sequential walk, which is always fine
			anyhow::ensure!(
				skip_lines == 0 || (skip_lines % 2 == 1 && skip_lines < lines),
				"Skip lines should be an uneven number smaller than number of cache lines"
			);
		}

		Ok(Self {
			lines,
			pattern,
			duration,
			threads,
			batch_steps,
			randomized,
			verbose,
			wait_before_exit,
		})
	}

	/// Returns the working set, in cache lines
	pub fn lines(&self) -> usize {
		self.lines
	}

	/// Returns the working set size of each worker, in bytes
	pub fn total_size(&self) -> usize {
		self.lines * LINE_SIZE
	}

	/// Returns the access pattern
	pub fn pattern(&self) -> AccessPattern {
		self.pattern
	}

	/// Returns the run duration
	pub fn duration(&self) -> Option<Duration> {
		self.duration
	}

	/// Returns the number of workers
	pub fn threads(&self) -> usize {
		self.threads
	}

	/// Returns the pattern steps per batch
	pub fn batch_steps(&self) -> usize {
		self.batch_steps
	}

	/// Returns if randomized access was requested.
	///
	/// Reserved, it doesn't change the access order.
	pub fn randomized(&self) -> bool {
		self.randomized
	}

	/// Returns if verbose output is enabled
	pub fn verbose(&self) -> bool {
		self.verbose
	}

	/// Returns if we should wait for input before exiting
	pub fn wait_before_exit(&self) -> bool {
		self.wait_before_exit
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			lines:            DEFAULT_LINES,
			pattern:          AccessPattern::default(),
			duration:         None,
			threads:          DEFAULT_THREADS,
			batch_steps:      DEFAULT_BATCH_STEPS,
			randomized:       false,
			verbose:          false,
			wait_before_exit: false,
		}
	}
}

/// Unvalidated configuration, see [`Config::new`]
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
	pub lines:            usize,
	pub pattern:          AccessPattern,
	pub duration:         Option<Duration>,
	pub threads:          usize,
	pub batch_steps:      usize,
	pub randomized:       bool,
	pub verbose:          bool,
	pub wait_before_exit: bool,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		let config = Config::default();
		Self {
			lines:            config.lines,
			pattern:          config.pattern,
			duration:         config.duration,
			threads:          config.threads,
			batch_steps:      config.batch_steps,
			randomized:       config.randomized,
			verbose:          config.verbose,
			wait_before_exit: config.wait_before_exit,
		}
	}
}
