use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use pad2osc::engine::{EngineHandle, EngineSettings};
use pad2osc::persistence::{ensure_default_config, FileConfigStore};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pad2osc", version, about = "Gamepad to OSC bridge")]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overwrite the config file with default settings and exit
    #[arg(long)]
    write_default_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => FileConfigStore::default_path()?,
    };

    if cli.write_default_config {
        ensure_default_config(&config_path, true)?;
        info!("Default settings written to {}", config_path.display());
        return Ok(());
    }

    if ensure_default_config(&config_path, false)? {
        info!("Created default config at {}", config_path.display());
    } else {
        info!("Using config {}", config_path.display());
    }

    let stop = CancellationToken::new();
    let engine = EngineHandle::spawn(EngineSettings { config_path }, stop.clone())
        .map_err(|e| eyre!("Failed to spawn engine: {}", e))?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Unable to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown requested");
        }
        _ = stop.cancelled() => {}
    }
    engine.stop();

    tokio::task::spawn_blocking(move || engine.join()).await??;
    info!("Stopped");
    Ok(())
}

fn setup(verbose: u8) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(verbose);
    Ok(())
}

fn setup_logging_env(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
