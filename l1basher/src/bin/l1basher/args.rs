//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
#[clap(about = "Keeps the L1 data cache busy by repeatedly reading memory in a fixed pattern")]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Duration, in seconds.
	///
	/// If not specified, runs until a line is entered.
	#[clap(short = 'd', value_parser = clap::value_parser!(u64).range(1..))]
	pub duration_secs: Option<u64>,

	/// Number of threads
	#[clap(short = 'T', default_value_t = l1basher::config::DEFAULT_THREADS)]
	pub threads: usize,

	/// Working set, in cache lines
	#[clap(short = 'n', value_parser = clap::value_parser!(u64).range(1..), default_value_t = l1basher::config::DEFAULT_LINES as u64)]
	pub lines: u64,

	/// Cache lines skipped after each touch.
	///
	/// Must be an uneven number smaller than the number of cache lines.
	/// Ignored by the `modulo` pattern.
	#[clap(long = "skip-lines", value_parser = clap::value_parser!(u64).range(1..))]
	pub skip_lines: Option<u64>,

	/// Access pattern
	#[clap(long = "pattern", value_enum, default_value_t = Pattern::Strided)]
	pub pattern: Pattern,

	/// Pattern steps between checks for stopping
	#[clap(long = "batch-steps", value_parser = clap::value_parser!(u64).range(1..), default_value_t = l1basher::config::DEFAULT_BATCH_STEPS as u64)]
	pub batch_steps: u64,

	/// Randomized access (reserved, currently doesn't change the access order)
	#[clap(short = 'r')]
	pub randomized: bool,

	/// Verbose output
	#[clap(short = 'v')]
	pub verbose: bool,

	/// Wait for a line to be entered before exiting
	#[clap(short = 'w', long = "wait-before-exit")]
	pub wait_before_exit: bool,

	/// Output file.
	///
	/// Writes the report as json to this file.
	#[clap(long = "output")]
	pub output_file: Option<PathBuf>,
}

/// Access pattern
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(clap::ValueEnum)]
pub enum Pattern {
	/// Walks the working set in strides of `1 + skip-lines` lines
	Strided,

	/// Touches line `step % lines`
	Modulo,
}
