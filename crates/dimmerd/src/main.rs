use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;
use tracing_subscriber::filter::LevelFilter;

use dimmerd::config::Config;
use dimmerd::device::SysfsLight;
use dimmerd::engine::Engine;
use dimmerd::input;
use dimmerd::store::FileStore;
use dimmerd::store::LevelStore;

/// Capacity for the button-to-engine event channel. Events are tiny and the
/// engine is fast; a small bound just absorbs bursts.
const EVENT_CHANNEL_SIZE: usize = 64;

/// One GPIO button controlling one dimmable light.
#[derive(Debug, Parser)]
#[command(name = "dimmerd", version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "/etc/dimmerd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Configuration failures are fatal: the device does not enter service.
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    tracing::info!("dimmerd starting");
    tracing::info!("loaded config from {}", args.config.display());

    let mode = config.mode()?;
    tracing::info!(
        "switch mode: dim {}, events {}, {} level(s), step {}",
        mode.dim_mode,
        mode.event_mode,
        mode.levels,
        mode.step,
    );
    tracing::info!(
        "button: {} (pull {:?}, active_low {}, debounce {:?})",
        config.button.value_path.display(),
        config.button.pull,
        config.button.active_low,
        config.debounce(),
    );

    let store = config
        .storage
        .as_ref()
        .map(|storage| Box::new(FileStore::new(storage.path.clone())) as Box<dyn LevelStore>);

    let light = SysfsLight::new(
        config.light.brightness_path.clone(),
        config.light.max_value,
    );

    let mut engine = Engine::new(mode.clone(), Box::new(light), store);

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let sampler = input::sysfs_sampler(
        config.button.value_path.clone(),
        config.button.active_low,
    );
    let pump = tokio::spawn(input::run_button(
        sampler,
        config.debounce(),
        mode.hold,
        tx,
    ));

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    tracing::info!("entering service loop");
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => engine.handle_event(event),
                None => {
                    tracing::error!("button input stopped unexpectedly");
                    break;
                }
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("failed to listen for interrupt: {e}");
                }
                tracing::info!("received interrupt");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
                break;
            }
        }
    }

    pump.abort();

    // The one unconditional safety net: whatever the logical state, leave
    // the output off.
    engine.force_off();
    tracing::info!("dimmerd shutdown complete");

    Ok(())
}
