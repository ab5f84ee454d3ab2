//! Config file loading. An explicit `--config` path wins; otherwise the search order is
//! ./bookstack-export.toml, then $XDG_CONFIG_HOME/bookstack-export/config.toml
//! (or ~/.config/bookstack-export/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys supply defaults for CLI flags.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the BookStack instance.
    pub url: Option<String>,
    /// API token id.
    pub token: Option<String>,
    /// API token secret.
    pub secret: Option<String>,
    /// Download directory. Relative paths resolve against the CWD.
    pub directory: Option<PathBuf>,
    /// Shelf slug to export. Ignored when a target is given on the command line.
    pub shelf: Option<String>,
    /// Book slug to export. Ignored when a target is given on the command line.
    pub book: Option<String>,
    pub split_book: Option<bool>,
    pub dir_clear: Option<bool>,
    pub modified_only: Option<bool>,
    pub test: Option<bool>,
    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
}

const LOCAL_CONFIG: &str = "bookstack-export.toml";

/// Read and parse one config file. Unlike [load_config], a missing file is an error.
pub fn load_config_file(path: &Path) -> Result<Config, String> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// Load `explicit` if given, else the first config found in the search order.
/// No config anywhere returns Ok(None).
pub fn load_config(explicit: Option<&Path>) -> Result<Option<Config>, String> {
    if let Some(path) = explicit {
        return load_config_file(path).map(Some);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join(LOCAL_CONFIG)];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("bookstack-export").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            return load_config_file(path).map(Some);
        }
    }
    Ok(None)
}
