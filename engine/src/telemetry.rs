//! Fire-and-forget tracking of verdicts.
//!
//! The pipeline hands a [`TrackingReport`] to a [`TelemetrySink`] and moves
//! on. Delivery failures are logged and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use adgate_types::TrackingReport;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use url::Url;

use crate::resolved::ResolvedConfig;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("tracking request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("tracking endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

pub trait TelemetrySink: Send + Sync {
    /// Queue a report. Must not block or fail.
    fn report(&self, report: TrackingReport);
}

/// Sink used when telemetry is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTelemetry;

impl TelemetrySink for DisabledTelemetry {
    fn report(&self, report: TrackingReport) {
        tracing::debug!(
            adblock = report.adblock,
            page = %report.page,
            "Telemetry disabled, dropping report"
        );
    }
}

/// POSTs reports as JSON to the tracking endpoint.
#[derive(Debug, Clone)]
pub struct HttpTelemetry {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTelemetry {
    pub fn new(endpoint: Url) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(TelemetryError::Client)?;
        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one report and wait for the response.
    pub async fn deliver(&self, report: &TrackingReport) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(report)
            .send()
            .await
            .map_err(TelemetryError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status));
        }
        Ok(())
    }
}

impl TelemetrySink for HttpTelemetry {
    fn report(&self, report: TrackingReport) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(endpoint = %self.endpoint, "No async runtime, dropping tracking report");
            return;
        };
        let sink = self.clone();
        runtime.spawn(async move {
            match sink.deliver(&report).await {
                Ok(()) => tracing::debug!(endpoint = %sink.endpoint, "Tracking report delivered"),
                Err(e) => {
                    tracing::warn!(
                        endpoint = %sink.endpoint,
                        error = %e,
                        "Failed to deliver tracking report"
                    );
                }
            }
        });
    }
}

/// The sink the resolved config asks for.
pub fn sink_for(config: &ResolvedConfig) -> Result<Arc<dyn TelemetrySink>, TelemetryError> {
    match &config.telemetry_endpoint {
        Some(endpoint) => Ok(Arc::new(HttpTelemetry::new(endpoint.clone())?)),
        None => Ok(Arc::new(DisabledTelemetry)),
    }
}

/// ISO-8601, millisecond precision, `Z` suffix.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn tracking_report(blocked: bool, page: &str) -> TrackingReport {
    TrackingReport {
        adblock: blocked,
        page: page.to_string(),
        timestamp: format_timestamp(Utc::now()),
    }
}
