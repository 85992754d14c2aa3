//! Logger
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`), and optionally
//! to a file, filtered by `RUST_LOG_FILE` (default `debug`).

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Initializes the global logger.
///
/// Any messages buffered through [`pre_init`] are emitted afterwards.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = fmt::layer()
		.with_writer(io::stderr)
		.with_filter(self::env_filter("RUST_LOG", "info"));

	let file_layer = log_file.and_then(|log_file| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(log_file);

		match file {
			Ok(file) => Some(
				fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(self::env_filter("RUST_LOG_FILE", "debug")),
			),
			Err(err) => {
				pre_init::warn(format!("Unable to open log file {log_file:?}: {err}"));
				None
			},
		}
	});

	if let Err(err) = tracing_subscriber::registry()
		.with(term_layer)
		.with(file_layer)
		.try_init()
	{
		eprintln!("Unable to initialize logger: {err}");
	}

	pre_init::flush();
}

/// Creates an env filter from `var`, falling back to `default`
fn env_filter(var: &str, default: &str) -> EnvFilter {
	EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logging before the logger is initialized
pub mod pre_init {
	// Imports
	use std::sync::{Mutex, PoisonError};

	/// Buffered message level
	#[derive(Clone, Copy, Debug)]
	enum Level {
		Debug,
		Warn,
	}

	/// Messages waiting for the logger
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::Debug, msg.into());
	}

	/// Buffers a warning
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::Warn, msg.into());
	}

	fn push(level: Level, msg: String) {
		MESSAGES.lock().unwrap_or_else(PoisonError::into_inner).push((level, msg));
	}

	/// Emits all buffered messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(PoisonError::into_inner));
		for (level, msg) in messages {
			match level {
				Level::Debug => tracing::debug!("{msg}"),
				Level::Warn => tracing::warn!("{msg}"),
			}
		}
	}
}
