use log::{LevelFilter, error, info};
use std::error::Error;
use std::path::PathBuf;

mod app;
mod config;
mod core;
mod game;

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG is parsed last so it wins over these defaults.
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("beatheist::game", LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("BeatHeist starting...");

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));

    if let Err(e) = app::run(&config_path) {
        error!("BeatHeist exited with error: {}", e);
        return Err(e.into());
    }

    info!("BeatHeist exited gracefully.");
    Ok(())
}
