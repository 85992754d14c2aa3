//! Basher
//!
//! Drives a whole run: allocates one workspace per worker, spawns the workers,
//! waits, stops and joins them, then reports.

// Imports
use {
	crate::{
		config::Config,
		diagnostics::ProcessDiagnostics,
		pattern::AccessPattern,
		report::Report,
		worker::Worker,
		workspace::Workspace,
	},
	anyhow::Context,
	itertools::Itertools,
	l1basher_util::{DisplayWrapper, WaitForLine},
	std::{fmt, io, process, thread},
};

/// Lifecycle phase.
///
/// Phases only ever move forward.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum Phase {
	Configuring,
	Allocating,
	Running,
	Stopping,
	Joined,
	Reporting,
	Done,
}

/// Basher
#[derive(Debug)]
pub struct Basher<'a> {
	/// Config
	config: &'a Config,

	/// Current phase
	phase: Phase,
}

impl<'a> Basher<'a> {
	/// Creates a new basher from a validated config
	pub fn new(config: &'a Config) -> Self {
		Self {
			config,
			phase: Phase::Configuring,
		}
	}

	/// Returns the current phase
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Runs the basher to completion.
	///
	/// User-facing output is written to `output`, and `input` is read from whenever
	/// we need to wait for the user. Returns the final report.
	///
	/// # Errors
	/// Returns an error if unable to allocate any workspace, spawn or join any worker,
	/// or use `input` / `output`. All of these are fatal, nothing is retried.
	pub fn run<R: io::BufRead, W: io::Write>(
		&mut self,
		input: &mut R,
		output: &mut W,
		diagnostics: &dyn ProcessDiagnostics,
	) -> Result<Report, anyhow::Error> {
		anyhow::ensure!(self.phase == Phase::Configuring, "Basher was already run");
		let config = self.config;
		let pattern = config.pattern();

		writeln!(
			output,
			"Bashing {} lines, skip {}, with {} threads, randomized:{} ...",
			config.lines(),
			pattern.skip_lines(),
			config.threads(),
			u8::from(config.randomized())
		)?;
		writeln!(output, "My PID is {}.", process::id())?;

		if !pattern.covers_all_lines(config.lines()) {
			tracing::warn!(
				lines = config.lines(),
				?pattern,
				period = pattern.period(config.lines()),
				"Access pattern repeats before touching every line"
			);
		}

		self.enter(Phase::Allocating);
		let workspaces = (0..config.threads())
			.map(|idx| {
				Workspace::new(config.lines(), Workspace::clock_fill_byte())
					.with_context(|| format!("Unable to allocate workspace for worker {idx}"))
			})
			.collect::<Result<Vec<_>, _>>()?;

		self.enter(Phase::Running);
		let workers = self
			.spawn_workers(workspaces, output)
			.context("Unable to spawn workers")?;
		self.wait_for_stop(input, output)?;

		self.enter(Phase::Stopping);
		for worker in &workers {
			worker.stop();
		}

		// Note: Every worker was already told to stop, so bailing out early
		//       won't leave any of them running forever.
		let outputs = workers
			.into_iter()
			.map(|worker| {
				let idx = worker.idx();
				worker.join().with_context(|| format!("Unable to join worker {idx}"))
			})
			.collect::<Result<Vec<_>, _>>()?;
		self.enter(Phase::Joined);

		self.enter(Phase::Reporting);
		let mut report = Report::new(config.lines(), pattern, outputs);
		match diagnostics.context_switches() {
			Ok(context_switches) => report.context_switches = context_switches,
			Err(err) => tracing::warn!(?err, "Unable to get process diagnostics"),
		}
		report
			.write_summary(output, config.verbose())
			.context("Unable to write report")?;

		if config.wait_before_exit() {
			writeln!(output, "Finished, press key to exit process...")?;
			self::wait_for_input(input, output)?;
		}

		self.enter(Phase::Done);
		Ok(report)
	}

	/// Spawns one worker per workspace.
	///
	/// On any error, all previously spawned workers are dropped, which stops them.
	fn spawn_workers<W: io::Write>(
		&self,
		workspaces: Vec<Workspace>,
		output: &mut W,
	) -> Result<Vec<Worker>, anyhow::Error> {
		let config = self.config;
		let mut workers = Vec::with_capacity(workspaces.len());
		for (idx, workspace) in workspaces.into_iter().enumerate() {
			let base_ptr = workspace.base_ptr();
			let worker = Worker::spawn(idx, workspace, config.pattern(), config.batch_steps())?;
			workers.push(worker);

			if config.verbose() {
				writeln!(output, "started thread {idx}")?;
				self::write_cadence(output, idx, base_ptr, config.pattern(), config.lines())?;
			}
		}

		Ok(workers)
	}

	/// Waits until the workers should be stopped
	fn wait_for_stop<R: io::BufRead, W: io::Write>(&self, input: &mut R, output: &mut W) -> Result<(), anyhow::Error> {
		match self.config.duration() {
			Some(duration) => {
				writeln!(output, "Running for {} seconds...", duration.as_secs_f64())?;
				output.flush()?;
				thread::sleep(duration);
			},
			None => {
				writeln!(output, "Press key to stop...")?;
				self::wait_for_input(input, output)?;
			},
		}

		Ok(())
	}

	/// Enters `phase`
	fn enter(&mut self, phase: Phase) {
		debug_assert!(phase > self.phase, "Phase went from {:?} to {phase:?}", self.phase);
		tracing::debug!(from = ?self.phase, to = ?phase, "Entering phase");
		self.phase = phase;
	}
}

/// Flushes `output` and waits for a line from `input`.
fn wait_for_input<R: io::BufRead, W: io::Write>(input: &mut R, output: &mut W) -> Result<(), anyhow::Error> {
	output.flush()?;
	if !input.wait_for_line().context("Unable to read input")? {
		tracing::debug!("Input reached EOF");
	}

	Ok(())
}

/// Writes the addresses worker `idx` will touch first
fn write_cadence<W: io::Write>(
	output: &mut W,
	idx: usize,
	base_ptr: *const u8,
	pattern: AccessPattern,
	lines: usize,
) -> Result<(), io::Error> {
	let cadence = pattern.cadence(lines);
	let steps = cadence
		.iter()
		.scan(None, |prev_offset: &mut Option<usize>, &offset| {
			let delta = prev_offset.filter(|&prev| prev < offset).map(|prev| offset - prev);
			*prev_offset = Some(offset);
			Some((base_ptr.wrapping_add(offset), delta))
		})
		.map(|(addr, delta)| {
			DisplayWrapper::new(move |f: &mut fmt::Formatter| {
				write!(f, "{addr:p}")?;
				if let Some(delta) = delta {
					write!(f, " (+0x{delta:x})")?;
				}
				Ok(())
			})
		});

	writeln!(output, "Thread {idx} will touch, in sequence: {} ...", steps.format(" "))
}
