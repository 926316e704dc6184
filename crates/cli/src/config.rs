//! Layered configuration: defaults, then an optional TOML file, then
//! `FLEETLOG_*` environment variables. Command-line flags are applied last
//! by the caller.

use std::path::{Path, PathBuf};

use fleetlog_core::ReconcileConfig;
use serde::Deserialize;

/// Default JSON reminder file, relative to the working directory.
pub(crate) const DEFAULT_DATA_PATH: &str = "reminders.json";

/// Default HTTP port for `fleetlog serve`.
pub(crate) const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Path of the JSON reminder store.
    pub(crate) data: PathBuf,
    pub(crate) port: u16,
    /// Seconds between background passes in `serve`. None = on demand only.
    pub(crate) reconcile_interval_secs: Option<u64>,
    pub(crate) reconcile: ReconcileConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            reconcile_interval_secs: None,
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `file` (if given) and the process environment.
    pub(crate) fn load(file: Option<&Path>) -> Result<Self, String> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        Self::from_toml(&text).map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
    }

    fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = lookup("FLEETLOG_DATA").filter(|v| !v.is_empty()) {
            self.data = PathBuf::from(data);
        }
        if let Some(port) = lookup("FLEETLOG_PORT") {
            self.port = port
                .parse()
                .map_err(|_| format!("invalid FLEETLOG_PORT '{}'", port))?;
        }
        if let Some(concurrency) = lookup("FLEETLOG_CONCURRENCY") {
            self.reconcile.concurrency = concurrency
                .parse()
                .map_err(|_| format!("invalid FLEETLOG_CONCURRENCY '{}'", concurrency))?;
        }
        Ok(())
    }
}
