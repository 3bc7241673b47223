//! hotserve - a local development server with live reload.

mod actor;
mod cli;
mod config;
mod context;
mod core;
mod embed;
mod index;
mod logger;
mod reload;
mod serve;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::Cli;
use config::Config;
use context::ServeContext;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Config::load(&cli)?;
    logger::set_verbose(config.log.verbose);
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }

    let ctx = Arc::new(ServeContext::new(&config.root, &config.serve.index)?);
    serve::bind_server(ctx, &config.serve)?.run()
}
