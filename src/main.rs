//! # mdviewer CLI
//!
//! Starts the local markdown viewer.
//!
//! ## Usage
//!
//! ```bash
//! mdviewer --root ~/notes --port 8080
//! mdviewer --config ./mdviewer.toml
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see every
//! mutation and every skipped file.

use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

use mdviewer::config::{self, Overrides, DEFAULT_BIND, DEFAULT_PORT};
use mdviewer::server;

/// A local markdown viewer with tags, search, and archiving.
#[derive(Parser)]
#[command(
    name = "mdviewer",
    about = "Local markdown viewer with tagging, search and archiving",
    version
)]
struct Cli {
    /// Root directory to scan for markdown files
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// HTTP port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Optional TOML configuration file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Only flags typed on the command line override the config file.
    let given = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);
    let overrides = Overrides {
        root: given("root").then_some(cli.root),
        bind: given("bind").then_some(cli.bind),
        port: given("port").then_some(cli.port),
    };
    let cfg = config::load_config(cli.config.as_deref(), overrides)?;

    server::run_server(&cfg).await
}
