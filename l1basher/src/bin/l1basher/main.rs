//! Cache line basher (`l1basher`)

// Modules
mod args;

// Imports
use {
	self::args::{Args, Pattern},
	anyhow::Context,
	clap::{error::ErrorKind, CommandFactory, Parser},
	l1basher::{AccessPattern, Basher, Config, ConfigBuilder, ProcStatus},
	l1basher_util::logger,
	std::{fs, io, time::Duration},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Build the config.
	// Note: Any invalid option is a usage error, so we let `clap` report it and exit.
	let config = match self::build_config(&args) {
		Ok(config) => config,
		Err(err) => Args::command().error(ErrorKind::ValueValidation, format!("{err:#}")).exit(),
	};
	tracing::debug!(?config, "Built config");

	// Then run
	let report = {
		let mut input = io::stdin().lock();
		let mut output = io::stdout().lock();
		Basher::new(&config)
			.run(&mut input, &mut output, &ProcStatus::current())
			.context("Unable to run basher")?
	};

	if let Some(output_path) = &args.output_file {
		let output_file = fs::File::create(output_path).context("Unable to create output file")?;
		serde_json::to_writer_pretty(output_file, &report).context("Unable to write to output file")?;
	}

	Ok(())
}

/// Builds the config from the arguments
fn build_config(args: &Args) -> Result<Config, anyhow::Error> {
	let lines = usize::try_from(args.lines).context("Number of cache lines is too large")?;
	let batch_steps = usize::try_from(args.batch_steps).context("Batch steps is too large")?;
	let skip_lines = args
		.skip_lines
		.map(usize::try_from)
		.transpose()
		.context("Skip lines is too large")?;

	let pattern = match args.pattern {
		Pattern::Strided => AccessPattern::Strided {
			skip_lines: skip_lines.unwrap_or(0),
		},
		Pattern::Modulo => {
			if skip_lines.is_some() {
				tracing::warn!("`--skip-lines` is ignored by the modulo pattern");
			}
			AccessPattern::Modulo
		},
	};

	Config::new(ConfigBuilder {
		lines,
		pattern,
		duration: args.duration_secs.map(Duration::from_secs),
		threads: args.threads,
		batch_steps,
		randomized: args.randomized,
		verbose: args.verbose,
		wait_before_exit: args.wait_before_exit,
	})
	.with_context(|| {
		format!(
			"Invalid options `-n {}` `--skip-lines {}`",
			args.lines,
			args.skip_lines.unwrap_or(0)
		)
	})
}
