//! Configuration loading for adgate.
//!
//! ```toml
//! [detection]
//! primary_timeout_ms = 1500
//! recheck_timeout_ms = 800
//! recheck_navigation_delay_ms = 500
//! probe_image_path = "/ads/ad.gif"
//! probe_script_path = "/ads/test.js"
//!
//! [telemetry]
//! enabled = true
//! base_url = "https://${SITE_HOST}"
//! ```
//!
//! Every field is optional; the engine resolves defaults.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ADGATE_CONFIG";

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct GateConfig {
    pub detection: Option<DetectionConfig>,
    pub telemetry: Option<TelemetryConfig>,
}

/// Probe deadlines and probe targets.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Deadline for the page-load run. Default: 1500.
    pub primary_timeout_ms: Option<u64>,
    /// Deadline for a user-triggered recheck. Default: 800.
    pub recheck_timeout_ms: Option<u64>,
    /// Pause before a recheck navigates. Default: 500.
    pub recheck_navigation_delay_ms: Option<u64>,
    /// Same-origin image conventionally targeted by blocklists.
    pub probe_image_path: Option<String>,
    /// Same-origin script conventionally targeted by blocklists.
    pub probe_script_path: Option<String>,
    /// Ad-vendor resources loaded by the third-party run.
    pub vendor_urls: Option<Vec<String>>,
}

/// Tracking endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Origin the tracking path is joined onto. `${VAR}` references are expanded.
    pub base_url: Option<String>,
    /// Tracking path. Default: `/api/track-adblock`.
    pub path: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            path: None,
        }
    }
}

impl TelemetryConfig {
    /// `base_url` with environment references expanded, if non-empty.
    #[must_use]
    pub fn expanded_base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .map(expand_env_vars)
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Replace `${VAR}` with the variable's value (empty if unset).
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl GateConfig {
    /// Load from the default location. `Ok(None)` when no file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "Failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content).map(Some).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// `$ADGATE_CONFIG`, else `~/.adgate/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".adgate").join("config.toml"))
}
