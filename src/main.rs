//! Sprig - headless demo for the Sprig ECS
//!
//! Simulates bouncing sprites for a fixed number of frames and logs stats once
//! per simulated second. Usage: `sprig [settings.toml]`, or
//! `sprig --write-config` to save the default settings file.

mod components;
mod demo;
mod headless;
mod passes;
mod settings;

use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use demo::Demo;
use settings::DemoSettings;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let arg = std::env::args_os().nth(1);
    if arg.as_deref() == Some(OsStr::new("--write-config")) {
        return DemoSettings::default()
            .save()
            .context("Failed to write default settings");
    }
    let path = arg.map(PathBuf::from);
    let settings = DemoSettings::load(path.as_deref());

    info!(
        "Starting Sprig demo in {} mode for {} frames",
        settings.demo.mode.name(),
        settings.demo.frames
    );

    let mut demo = Demo::new(settings)?;
    let summary = demo.run();

    info!(
        frames = summary.frames,
        seconds = summary.seconds,
        spawned = summary.spawned,
        despawned = summary.despawned,
        entities = summary.entities,
        draws = summary.draws,
        "Demo finished"
    );
    if let Some(time) = demo.world().time() {
        info!(
            offscreen = demo.recorder().offscreen(),
            "Final frame - {time}"
        );
    }
    Ok(())
}
