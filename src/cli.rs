//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gazette blog engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: gazette.toml)
    #[arg(short = 'C', long, default_value = "gazette.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new site (config, posts/pages/templates directories)
    Init {
        /// the name(path) of the site directory, relative to `root`
        name: Option<PathBuf>,
    },

    /// Create a blank post in the posts directory
    Create {
        /// post title, used for the filename and front-matter
        name: Vec<String>,
    },

    /// Create a blank page in the pages directory
    Page {
        /// page title, used for the filename and front-matter
        name: Vec<String>,
    },

    /// Serve the site, rebuilding and hot-swapping on change
    Server {
        /// Use the development port instead of the production port
        #[arg(short, long)]
        devel: bool,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable the file watcher (serve a static snapshot)
        #[arg(long)]
        no_watch: bool,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_server(&self) -> bool {
        matches!(self.command, Commands::Server { .. })
    }
}
