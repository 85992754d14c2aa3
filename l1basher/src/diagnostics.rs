//! Process diagnostics

// Imports
use {
	anyhow::Context,
	std::{
		fs,
		path::{Path, PathBuf},
	},
};

/// Process diagnostics
pub trait ProcessDiagnostics {
	/// Returns the context switch counters of this process, one per line
	fn context_switches(&self) -> Result<Vec<String>, anyhow::Error>;
}

/// Diagnostics from a `/proc`-style status file.
///
/// Reports every line containing [`ProcStatus::CONTEXT_SWITCH_MARKER`], verbatim.
#[derive(Clone, Debug)]
pub struct ProcStatus {
	/// Status file path
	path: PathBuf,
}

impl ProcStatus {
	/// Marker for context switch lines
	pub const CONTEXT_SWITCH_MARKER: &'static str = "ctxt";

	/// Status file of the current process
	pub const SELF_STATUS_PATH: &'static str = "/proc/self/status";

	/// Creates diagnostics for the current process
	pub fn current() -> Self {
		Self::from_path(Self::SELF_STATUS_PATH)
	}

	/// Creates diagnostics from a status file
	pub fn from_path(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}
}

impl ProcessDiagnostics for ProcStatus {
	fn context_switches(&self) -> Result<Vec<String>, anyhow::Error> {
		let status =
			fs::read_to_string(&self.path).with_context(|| format!("Unable to read status file {:?}", self.path))?;

		let lines = status
			.lines()
			.filter(|line| line.contains(Self::CONTEXT_SWITCH_MARKER))
			.map(str::to_owned)
			.collect();
		Ok(lines)
	}
}

/// No diagnostics
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDiagnostics;

impl ProcessDiagnostics for NoDiagnostics {
	fn context_switches(&self) -> Result<Vec<String>, anyhow::Error> {
		Ok(vec![])
	}
}
