//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config FILE`)
//! 3. `TABDUPE_*` environment variables (e.g. `TABDUPE_SKIP_EMPTY=true`)
//! 4. Command-line flags, applied by the caller
//!
//! A file that cannot be parsed is reported with a warning and ignored.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "TABDUPE_";

const KNOWN_KEYS: &[&str] = &[
    "output",
    "reports_dir",
    "write_report",
    "skip_empty",
    "show_progress",
    "pause_on_exit",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format for `scan`.
    pub output: OutputFormat,
    /// Report directory; `Reports` next to the executable when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
    /// Write a text report after each scan.
    pub write_report: bool,
    /// Ignore blank cells.
    pub skip_empty: bool,
    /// Show a progress bar while scanning.
    pub show_progress: bool,
    /// Wait for Enter before the program exits.
    pub pause_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputFormat::Text,
            reports_dir: None,
            write_report: true,
            skip_empty: false,
            show_progress: true,
            pause_on_exit: false,
        }
    }
}

impl Config {
    /// Load the configuration, from `custom` if given, else the default path.
    pub fn load(custom: Option<&Path>) -> Self {
        match custom.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(path) => Self::load_from_path(path),
            None => {
                log::debug!("No config directory available, using defaults");
                Self::figment_from(Figment::from(Serialized::defaults(Config::default())))
            }
        }
    }

    /// Load the configuration from a specific file, layered with defaults
    /// and environment variables. A missing file is not an error.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            warn_unknown_keys(path);
        } else {
            log::debug!("Config file {} not found, using defaults", path.display());
        }
        Self::figment_from(Self::figment(path))
    }

    /// The figment for a config file: defaults, then the file, then env.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn figment_from(figment: Figment) -> Self {
        match figment.extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Write the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "tabdupe", "tabdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Log unknown top-level keys, suggesting the closest known one.
fn warn_unknown_keys(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return;
    };
    for key in table.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        match closest_key(key) {
            Some(known) => log::warn!(
                "Unknown config key '{}' in {} (did you mean '{}'?)",
                key,
                path.display(),
                known
            ),
            None => log::warn!("Unknown config key '{}' in {}", key, path.display()),
        }
    }
}

fn closest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|k| (*k, strsim::jaro_winkler(k, key)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
}
