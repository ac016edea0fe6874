
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use vxi11_capture::registry::{self, Registry};
use vxi11_capture::{capture, Config, JsonRenderer, Renderer, Result, Vxi11Connector};

/// Capture one waveform from a VXI-11 oscilloscope and print it as JSON
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// TOML configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Instrument address to probe (repeatable)
	#[arg(long = "host")]
	hosts: Vec<String>,

	/// Find instruments with a port mapper broadcast
	#[arg(long)]
	discover: bool,

	/// Model to capture from, as reported by *IDN?
	#[arg(short, long)]
	model: Option<String>,

	/// Source channel
	#[arg(long)]
	channel: Option<u8>,

	/// How long to wait for the trigger, in milliseconds
	#[arg(long)]
	timeout_ms: Option<u64>,

	/// List the instruments found and exit
	#[arg(long)]
	list: bool,

	/// Pretty-print the JSON output
	#[arg(long)]
	pretty: bool,
}

fn load_config(args:&Args) -> Result<Config> {
	let mut config = match &args.config {
		Some(path) => Config::from_file(path)?,
		None       => Config::default(),
	};

	config.hosts.extend(args.hosts.iter().cloned());
	config.discover |= args.discover;
	if let Some(model) = &args.model { config.model = model.clone(); }
	if let Some(channel) = args.channel { config.channel = channel; }
	if let Some(ms) = args.timeout_ms { config.trigger_timeout_ms = ms; }

	config.validate()?;
	Ok(config)
}

fn run(args:&Args) -> Result<()> {
	let config = load_config(args)?;

	let mut candidates:Vec<String> = config.hosts.clone();
	if config.discover {
		for host in registry::broadcast_candidates(config.discovery_listen())? {
			if !candidates.contains(&host) { candidates.push(host); }
		}
	}
	info!("Probing {} candidate(s)", candidates.len());

	let connector = Vxi11Connector{ io_timeout: config.io_timeout() };
	let instruments = Registry::discover(connector, &candidates);

	if args.list {
		for (model, entry) in instruments.entries() {
			println!("{}\t{}", model, entry.descriptor);
		}
		return Ok(());
	}

	let waveform = instruments.with_instrument(&config.model, |scope| {
		capture(scope, &config.commands, config.acquisition_options(), config.channel)
	})?;

	let mut renderer = JsonRenderer::new(io::stdout().lock()).pretty(args.pretty);
	renderer.render(&waveform)
}

pub fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	match run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("Capture failed: {}", e);
			ExitCode::FAILURE
		}
	}
}
