//! Runtime configuration.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional TOML file, and command-line flags.
//!
//! ```toml
//! root = "/home/me/notes"
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8080
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Interface bound when neither the config file nor `--bind` sets one.
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Port used when neither the config file nor `--port` sets one.
pub const DEFAULT_PORT: u16 = 8080;

/// Fully resolved settings the server starts from.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute, canonical root directory.
    pub root: PathBuf,
    /// Listener settings.
    pub server: ServerConfig,
}

/// Address the HTTP server listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `127.0.0.1` or `0.0.0.0`.
    pub bind: String,
    /// TCP port.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` suitable for `TcpListener::bind`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Values taken from the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--root`; may be relative to the working directory.
    pub root: Option<PathBuf>,
    /// `--bind`.
    pub bind: Option<String>,
    /// `--port`.
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    root: Option<PathBuf>,
    #[serde(default)]
    server: FileServerConfig,
}

#[derive(Debug, Deserialize, Default)]
struct FileServerConfig {
    bind: Option<String>,
    port: Option<u16>,
}

/// Merges defaults, the optional config file, and CLI overrides, then
/// resolves the root directory.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let file = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<FileConfig>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let root = overrides
        .root
        .or(file.root)
        .unwrap_or_else(|| PathBuf::from("."));
    let server = ServerConfig {
        bind: overrides
            .bind
            .or(file.server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
    };

    if server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    Ok(Config {
        root: resolve_root(&root)?,
        server,
    })
}

/// Makes `root` absolute and checks that it is an existing directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    let absolute = std::fs::canonicalize(root)
        .with_context(|| format!("Failed to resolve root: {}", root.display()))?;
    let meta = std::fs::metadata(&absolute)
        .with_context(|| format!("Failed to stat root: {}", absolute.display()))?;
    if !meta.is_dir() {
        bail!("root is not a directory: {}", absolute.display());
    }
    Ok(absolute)
}
