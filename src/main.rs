//! yt-radio: Waybar custom-module controller for an mpv started with
//! `--input-ipc-server=/tmp/mpvsocket --idle`.
//!
//! Waybar config sketch:
//! ```json
//! "custom/yt-radio": {
//!     "exec": "yt-radio status", "return-type": "json", "interval": 2,
//!     "on-click": "yt-radio toggle",
//!     "on-scroll-up": "yt-radio next", "on-scroll-down": "yt-radio previous"
//! }
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yt_radio::{settings, Action, Config, Effect, Paths};

/// Play, skip and show a YouTube radio playlist in a running mpv
#[derive(Parser)]
#[command(name = "yt-radio", version, about, long_about = None)]
struct Cli {
    #[arg(value_enum)]
    action: Action,
}

// stdout belongs to Waybar, so logs go to stderr
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::resolve()?;
    let config: Config = settings::load(&paths.config).context("loading config")?;
    init_tracing(&config.logging.level);

    if let Effect::Print(status) = yt_radio::invoke(&paths, config, cli.action)? {
        println!("{status}");
    }
    Ok(())
}
