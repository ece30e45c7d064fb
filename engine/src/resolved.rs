//! Resolved configuration.
//!
//! Turns the optional, file-level [`GateConfig`] into concrete durations,
//! probe targets and a telemetry endpoint.

use std::time::Duration;

use adgate_config::{DetectionConfig, GateConfig, TelemetryConfig};
use thiserror::Error;
use url::Url;

pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_RECHECK_TIMEOUT: Duration = Duration::from_millis(800);
pub const DEFAULT_RECHECK_NAVIGATION_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_PROBE_IMAGE_PATH: &str = "/ads/ad.gif";
pub const DEFAULT_PROBE_SCRIPT_PATH: &str = "/ads/test.js";
pub const DEFAULT_TRACKING_PATH: &str = "/api/track-adblock";

pub const DEFAULT_VENDOR_URLS: &[&str] = &[
    "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js",
    "https://googleads.g.doubleclick.net/pagead/ads",
    "https://securepubads.g.doubleclick.net/gampad/ads",
];

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
    #[error("vendor_urls must not be empty")]
    NoVendorUrls,
    #[error("invalid telemetry URL {url}: {source}")]
    TelemetryUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Resources the first- and third-party probes load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTargets {
    pub image_path: String,
    pub script_path: String,
    pub vendor_urls: Vec<String>,
}

impl Default for ProbeTargets {
    fn default() -> Self {
        Self {
            image_path: DEFAULT_PROBE_IMAGE_PATH.to_string(),
            script_path: DEFAULT_PROBE_SCRIPT_PATH.to_string(),
            vendor_urls: DEFAULT_VENDOR_URLS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub primary_timeout: Duration,
    pub recheck_timeout: Duration,
    pub recheck_navigation_delay: Duration,
    pub targets: ProbeTargets,
    /// `None` when telemetry is disabled or has nowhere to go.
    pub telemetry_endpoint: Option<Url>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            primary_timeout: DEFAULT_PRIMARY_TIMEOUT,
            recheck_timeout: DEFAULT_RECHECK_TIMEOUT,
            recheck_navigation_delay: DEFAULT_RECHECK_NAVIGATION_DELAY,
            targets: ProbeTargets::default(),
            telemetry_endpoint: None,
        }
    }
}

impl ResolvedConfig {
    pub fn from_config(config: &GateConfig) -> Result<Self, ResolveError> {
        let detection = config.detection.clone().unwrap_or_default();
        let telemetry = config.telemetry.clone().unwrap_or_default();

        let primary_timeout = timeout_ms(
            "primary_timeout_ms",
            detection.primary_timeout_ms,
            DEFAULT_PRIMARY_TIMEOUT,
        )?;
        let recheck_timeout = timeout_ms(
            "recheck_timeout_ms",
            detection.recheck_timeout_ms,
            DEFAULT_RECHECK_TIMEOUT,
        )?;
        let recheck_navigation_delay = detection
            .recheck_navigation_delay_ms
            .map_or(DEFAULT_RECHECK_NAVIGATION_DELAY, Duration::from_millis);

        Ok(Self {
            primary_timeout,
            recheck_timeout,
            recheck_navigation_delay,
            targets: resolve_targets(detection)?,
            telemetry_endpoint: resolve_endpoint(&telemetry)?,
        })
    }
}

fn timeout_ms(
    field: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, ResolveError> {
    match value {
        None => Ok(default),
        Some(0) => Err(ResolveError::ZeroTimeout { field }),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

fn resolve_targets(detection: DetectionConfig) -> Result<ProbeTargets, ResolveError> {
    let defaults = ProbeTargets::default();
    let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());

    let vendor_urls = match detection.vendor_urls {
        Some(urls) if urls.is_empty() => return Err(ResolveError::NoVendorUrls),
        Some(urls) => urls,
        None => defaults.vendor_urls,
    };

    Ok(ProbeTargets {
        image_path: non_empty(detection.probe_image_path).unwrap_or(defaults.image_path),
        script_path: non_empty(detection.probe_script_path).unwrap_or(defaults.script_path),
        vendor_urls,
    })
}

fn resolve_endpoint(telemetry: &TelemetryConfig) -> Result<Option<Url>, ResolveError> {
    if !telemetry.enabled {
        return Ok(None);
    }
    let Some(base) = telemetry.expanded_base_url() else {
        tracing::debug!("Telemetry enabled but no base_url configured");
        return Ok(None);
    };
    let path = telemetry
        .path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_TRACKING_PATH);

    Url::parse(&base)
        .and_then(|base| base.join(path))
        .map(Some)
        .map_err(|source| ResolveError::TelemetryUrl { url: base, source })
}
