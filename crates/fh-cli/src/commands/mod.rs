//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod comments;
pub mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fh_core::config::{Config, DEFAULT_CONFIG_PATH};
use fh_storage::FileSystemStore;
use std::path::PathBuf;
use tracing::debug;

/// fanhub - threaded comments for fan community posts
#[derive(Debug, Parser)]
#[command(name = "fanhub")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the comment data
    #[arg(long, global = true, env = "FANHUB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read and write post comments
    #[command(subcommand)]
    Comments(comments::CommentsCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Settings shared by every command
pub struct AppContext {
    pub config_path: PathBuf,
    pub config: Config,
    data_dir: Option<PathBuf>,
}

impl AppContext {
    fn load(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let config = Config::load_or_default(&config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

        Ok(Self {
            config_path,
            config,
            data_dir,
        })
    }

    /// Data directory: flag, then config, then the platform default
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| self.config.storage.data_dir.clone())
            .unwrap_or_else(FileSystemStore::default_dir)
    }

    /// Open the comment store in the resolved data directory
    pub fn open_store(&self) -> Result<FileSystemStore> {
        let dir = self.data_dir();
        debug!("Using data directory {:?}", dir);
        FileSystemStore::new(&dir)
            .with_context(|| format!("Failed to open comment store at {}", dir.display()))
    }
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = AppContext::load(cli.config, cli.data_dir)?;

    match cli.command {
        Commands::Comments(cmd) => comments::execute(cmd, &ctx),
        Commands::Config(cmd) => config::execute(cmd, &ctx),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "fanhub",
            "-vv",
            "--no-color",
            "--data-dir",
            "/tmp/fh",
            "comments",
            "authors",
            "--post",
            "p1",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fh")));
        assert!(matches!(cli.command, Commands::Comments(_)));
    }

    #[test]
    fn test_data_dir_precedence() {
        let mut ctx = AppContext {
            config_path: PathBuf::from("c.toml"),
            config: Config::default(),
            data_dir: None,
        };
        ctx.config.storage.data_dir = Some(PathBuf::from("/from/config"));
        assert_eq!(ctx.data_dir(), PathBuf::from("/from/config"));

        ctx.data_dir = Some(PathBuf::from("/from/flag"));
        assert_eq!(ctx.data_dir(), PathBuf::from("/from/flag"));
    }
}
