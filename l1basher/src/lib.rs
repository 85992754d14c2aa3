//! Cache line basher (`l1basher`)
//!
//! Keeps the L1 data cache (or any working set) busy by having threads
//! repeatedly read memory in a fixed, cache-line granular, pattern.

// Modules
pub mod basher;
pub mod config;
pub mod diagnostics;
pub mod pattern;
pub mod report;
pub mod worker;
pub mod workspace;

// Exports
pub use self::{
	basher::{Basher, Phase},
	config::{Config, ConfigBuilder},
	diagnostics::{NoDiagnostics, ProcStatus, ProcessDiagnostics},
	pattern::AccessPattern,
	report::Report,
	worker::{StopFlag, Worker, WorkerOutput},
	workspace::{Workspace, LINE_SIZE},
};
