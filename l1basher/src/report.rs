//! Report

// Imports
use {
	crate::{pattern::AccessPattern, worker::WorkerOutput},
	average::Variance,
	std::{fmt, io},
};

/// Report of a whole run
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Report {
	/// Working set, in cache lines
	pub lines: usize,

	/// Access pattern
	pub pattern: AccessPattern,

	/// Per-worker reports, in spawn order
	pub workers: Vec<WorkerReport>,

	/// Total iterations
	pub total_iterations: u64,

	/// Sum of all worker accumulators
	pub total_useless: u64,

	/// Iterations per worker statistics.
	///
	/// `None` without any workers
	pub iterations_stats: Option<IterationsStats>,

	/// Context switch counters
	pub context_switches: Vec<String>,
}

impl Report {
	/// Aggregates the outputs of all workers, in spawn order
	pub fn new(lines: usize, pattern: AccessPattern, outputs: impl IntoIterator<Item = WorkerOutput>) -> Self {
		let workers = outputs
			.into_iter()
			.enumerate()
			.map(|(idx, output)| WorkerReport {
				idx,
				iterations: output.iterations,
				useless: output.useless,
			})
			.collect::<Vec<_>>();

		let total_iterations = workers.iter().map(|worker| worker.iterations).sum();
		let total_useless = workers
			.iter()
			.fold(0u64, |acc, worker| acc.wrapping_add(worker.useless));

		let iterations_stats = (!workers.is_empty()).then(|| {
			let variance = workers
				.iter()
				.map(|worker| worker.iterations as f64)
				.collect::<Variance>();
			IterationsStats {
				mean:    variance.mean(),
				std_dev: variance.population_variance().sqrt(),
			}
		});

		Self {
			lines,
			pattern,
			workers,
			total_iterations,
			total_useless,
			iterations_stats,
			context_switches: vec![],
		}
	}

	/// Returns the total iterations, in millions
	pub fn total_iterations_mio(&self) -> f64 {
		self.total_iterations as f64 / 1_000_000.0
	}

	/// Writes this report's summary.
	///
	/// If `verbose`, also includes the per-worker details.
	pub fn write_summary<W: io::Write>(&self, writer: &mut W, verbose: bool) -> Result<(), io::Error> {
		if verbose {
			for worker in &self.workers {
				writeln!(writer, "Thread {} Iterations {}", worker.idx, worker.iterations)?;
			}
		}

		writeln!(
			writer,
			"All Iterations: {} ({:.2} mio)",
			self.total_iterations,
			self.total_iterations_mio()
		)?;

		if verbose {
			if let Some(stats) = &self.iterations_stats {
				writeln!(writer, "Iterations per thread: {stats}")?;
			}
			writeln!(writer, "useless: {}", self.total_useless)?;
		}

		for line in &self.context_switches {
			writeln!(writer, "{line}")?;
		}

		Ok(())
	}
}

/// Report of a single worker
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct WorkerReport {
	pub idx:        usize,
	pub iterations: u64,
	pub useless:    u64,
}

/// Iterations per worker statistics
#[derive(PartialEq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IterationsStats {
	pub mean:    f64,
	pub std_dev: f64,
}

impl fmt::Display for IterationsStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:.2} ± {:.2}", self.mean, self.std_dev)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn output(iterations: u64, useless: u64) -> WorkerOutput {
		WorkerOutput { iterations, useless }
	}

	#[test]
	fn no_workers_is_zero() {
		let report = Report::new(8, AccessPattern::default(), []);
		assert_eq!(report.total_iterations, 0);
		assert_eq!(report.total_useless, 0);
		assert!(report.workers.is_empty());
		assert_eq!(report.iterations_stats, None);
	}

	#[test]
	fn sums_workers_in_order() {
		let report = Report::new(8, AccessPattern::Modulo, [output(2, 10), output(4, 20), output(6, u64::MAX)]);
		assert_eq!(report.total_iterations, 12);
		assert_eq!(report.total_useless, 29);
		assert_eq!(report.workers.iter().map(|worker| worker.idx).collect::<Vec<_>>(), [0, 1, 2]);

		let stats = report.iterations_stats.unwrap();
		assert!((stats.mean - 4.0).abs() < 1e-9);
		assert!((stats.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
	}

	#[test]
	fn summary_format() {
		let mut report = Report::new(8, AccessPattern::default(), [output(1_500_000, 7), output(500_000, 1)]);
		report.context_switches = vec!["voluntary_ctxt_switches:\t5".to_owned()];

		let mut summary = vec![];
		report.write_summary(&mut summary, false).unwrap();
		assert_eq!(
			String::from_utf8(summary).unwrap(),
			"All Iterations: 2000000 (2.00 mio)\nvoluntary_ctxt_switches:\t5\n"
		);

		let mut summary = vec![];
		report.write_summary(&mut summary, true).unwrap();
		let summary = String::from_utf8(summary).unwrap();
		assert!(summary.starts_with("Thread 0 Iterations 1500000\nThread 1 Iterations 500000\n"));
		assert!(summary.contains("useless: 8\n"));
		assert!(summary.contains("Iterations per thread: 1000000.00 ± 500000.00\n"));
	}

	#[test]
	fn serializes_to_json() {
		let report = Report::new(4, AccessPattern::Strided { skip_lines: 1 }, [output(3, 9)]);
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["total_iterations"], 3);
		assert_eq!(json["pattern"]["kind"], "strided");
		assert_eq!(json["pattern"]["skip_lines"], 1);
		assert_eq!(json["workers"][0]["useless"], 9);
	}
}
