use std::{
    env,
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Result;
use clap::Parser;
use flightstream::{parameters::StreamConfig, runner::StreamRunner};
use log::{error, info, warn};

/// Replays a recorded track log as a fixed-rate UDP frame stream.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV track log, overrides `input` from the configuration file
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per gap between two samples
    #[arg(short, long)]
    frame_rate: Option<u32>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }

    pretty_env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        if let Err(err) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            warn!("Could not install Ctrl-C handler: {err}");
        }
    }

    let runner = StreamRunner::new(config, cancel)?;

    match runner.run_blocking() {
        Ok(summary) if summary.cancelled => info!("Stopped early"),
        Ok(_) => info!("Done"),
        Err(err) => {
            error!("{err:#}");
            process::exit(1);
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Reading configuration from '{}'", path.display());
            StreamConfig::from_file(path)?
        }
        None => StreamConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input = Some(input.clone());
    }
    if let Some(frame_rate) = args.frame_rate {
        config.frame_rate = frame_rate;
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    Ok(config)
}
