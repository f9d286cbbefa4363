//! Gazette - a self-hosted blog engine with hot reload.

mod cli;
mod config;
mod content;
mod engine;
mod init;
mod logger;
mod render;
mod serve;
mod snapshot;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use content::ContentKind;
use engine::Engine;
use init::new_site;
use std::{path::Path, sync::Arc};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(|| Path::new("./").into());

    match &cli.command {
        Commands::Init { name } => {
            let target = match name {
                Some(name) => root.join(name),
                None => root,
            };
            new_site(&target, name.is_some())
        }
        Commands::Create { name } => {
            let config = load_config(&cli)?;
            init::create_blank(&config, &name.join(" "), ContentKind::Post).map(|_| ())
        }
        Commands::Page { name } => {
            let config = load_config(&cli)?;
            init::create_blank(&config, &name.join(" "), ContentKind::Page).map(|_| ())
        }
        Commands::Server {
            devel,
            interface,
            port,
            no_watch,
        } => {
            let mut config = load_config(&cli)?;
            if let Some(interface) = interface {
                config.serve.interface = interface.clone();
            }
            if let Some(port) = port {
                if *devel {
                    config.serve.development_port = *port;
                } else {
                    config.serve.production_port = *port;
                }
            }
            if *no_watch {
                config.serve.watch = false;
            }

            let engine = Arc::new(Engine::new(config));

            // Graceful shutdown on Ctrl+C
            let engine_for_signal = Arc::clone(&engine);
            ctrlc::set_handler(move || {
                log!("serve"; "shutting down...");
                engine_for_signal.request_stop();
            })
            .context("Failed to set Ctrl+C handler")?;

            engine.run(*devel)
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at `{}`. Try initializing a site here: `gazette init`.",
            config_path.display()
        );
    }

    let config = Config::load(&config_path)?;
    Ok(config)
}
