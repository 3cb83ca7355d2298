//! CLI interface for SiteSeer.
//!
//! `siteseer run` is what the device runs at boot. The other commands
//! exercise one piece of the loop at a time, for bring-up and debugging:
//!
//! - `siteseer once` — start up and run exactly one iteration
//! - `siteseer directions` — serve a pending directions request, if any
//! - `siteseer config` — show the resolved configuration

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::{
    auth::TokenSource,
    classify::{AutoMl, CloudStorage},
    config::{self, Config},
    control::{ControlLoop, LoopSettings, Services},
    directions::{self, GoogleMaps},
    hardware::{CommandCamera, SysfsPin},
    logging,
    store::FirebaseStore,
};

use format::{describe_outcome, describe_report};

/// SiteSeer — see, announce, and guide.
#[derive(Debug, Parser)]
#[command(name = "siteseer", after_long_help = CONFIG_HELP)]
pub struct Cli {
    /// Config file. Falls back to `SITESEER_CONFIG`, then `~/.siteseer/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const CONFIG_HELP: &str = r#"Configuration (~/.siteseer/config.toml):
  [store]
  url = "https://siteseer.firebaseio.com"

  [maps]
  api-key = "..."            # or SITESEER_MAPS_KEY

  [classifier]
  project = "siteseer"
  model = "ICN..."

  [blob]
  bucket = "siteseer"

Google credentials come from SITESEER_ACCESS_TOKEN, [google] access-token,
or `gcloud auth print-access-token`."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the device and loop until killed.
    Run,

    /// Start the device and run a single iteration.
    ///
    /// The iteration report JSON is written to `--out` (if given) or stdout.
    Once {
        /// Write the report JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Serve one directions request if the trigger flag is set.
    ///
    /// Touches only the store and the mapping service.
    Directions,

    /// Print the resolved config path and configuration, secrets redacted.
    Config,
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let path = config::resolve_path(cli.config.as_deref())?;
    let config = Config::load(&path)?;

    match cli.command {
        Command::Run => cmd_run(&config),
        Command::Once { out } => cmd_once(&config, out.as_deref()),
        Command::Directions => cmd_directions(&config),
        Command::Config => cmd_config(&path, &config),
    }
}

fn cmd_run(config: &Config) -> Result<(), String> {
    let mut device = start_device(config)?;
    device.run()
}

fn cmd_once(config: &Config, out: Option<&Path>) -> Result<(), String> {
    let mut device = start_device(config)?;
    let report = device.tick().map_err(|e| format!("iteration failed: {e}"))?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("failed to serialize report: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("{} → {}", describe_report(&report), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_directions(config: &Config) -> Result<(), String> {
    let store = store(config);
    let maps = maps(config)?;

    let outcome = directions::resolve(&store, &maps).map_err(|e| format!("directions: {e}"))?;

    match outcome {
        Some(outcome) => println!("{}", describe_outcome(&outcome)),
        None => eprintln!("No directions request pending"),
    }
    Ok(())
}

fn cmd_config(path: &Path, config: &Config) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&config.redacted())
        .map_err(|e| format!("failed to serialize config: {e}"))?;

    eprintln!("Config: {}", path.display());
    println!("{json}");
    Ok(())
}

// ── Wiring ──

fn start_device(config: &Config) -> Result<ControlLoop, String> {
    let token = TokenSource::from_config(&config.google);

    let pin = SysfsPin::input(&config.touch.gpio_root, config.touch.pin)
        .map_err(|e| format!("failed to set up touch sensor: {e}"))?;

    let services = Services {
        store: Box::new(store(config)),
        pin: Box::new(pin),
        camera: Box::new(CommandCamera::new(
            config.camera.command.clone(),
            config.camera.args.clone(),
        )),
        maps: Box::new(maps(config)?),
        classifier: Box::new(AutoMl::new(
            &config.classifier.endpoint,
            &config.classifier.project,
            &config.classifier.region,
            &config.classifier.model,
            token.clone(),
        )),
        blobs: Box::new(CloudStorage::new(
            &config.blob.endpoint,
            &config.blob.bucket,
            token,
        )),
    };

    let settings = LoopSettings {
        image_path: config.camera.image_path.clone(),
        score_threshold: config.classifier.score_threshold,
        blob_object: config.blob.object.clone(),
        iteration_delay: config.pacing.iteration_delay(),
    };

    ControlLoop::start(services, settings).map_err(|e| format!("failed to start: {e}"))
}

fn store(config: &Config) -> FirebaseStore {
    FirebaseStore::new(config.store.url.clone(), config.store.auth.clone())
}

fn maps(config: &Config) -> Result<GoogleMaps, String> {
    let key = config
        .maps
        .api_key
        .clone()
        .ok_or("maps.api-key is not set")?;
    Ok(GoogleMaps::new(config.maps.endpoint.clone(), key))
}
