//! Page-load and recheck pipelines.

use std::sync::Arc;
use std::time::Duration;

use adgate_core::cosmetic;
use adgate_core::{PageSession, SessionError, Transition, classify, decide};
use adgate_types::{ExecutionContext, UiState, Verdict};
use serde::Serialize;

use crate::GateError;
use crate::detector::{Detection, RunSummary, detect};
use crate::filter::{self, CosmeticReport};
use crate::host::PageHost;
use crate::resolved::ResolvedConfig;
use crate::telemetry::{TelemetrySink, tracking_report};

/// Shown when a recheck still sees blocking.
pub const STILL_BLOCKED_FEEDBACK: &str = "Still blocked. Please whitelist and try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLoadOutcome {
    pub path: String,
    pub context: ExecutionContext,
    pub verdict: Verdict,
    pub ui_state: UiState,
    pub first_party: RunSummary,
    pub third_party: RunSummary,
    /// Set when the load ended in a navigation.
    pub navigation: Option<String>,
    /// Set when the cosmetic pass ran.
    pub cosmetic: Option<CosmeticReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecheckOutcome {
    pub verdict: Verdict,
    pub ui_state: UiState,
    pub first_party: RunSummary,
    pub third_party: RunSummary,
    pub navigation: Option<String>,
    pub feedback: Option<String>,
}

/// Drives one page load against a host.
pub struct AdGate {
    host: Arc<dyn PageHost>,
    config: ResolvedConfig,
    telemetry: Arc<dyn TelemetrySink>,
    session: PageSession,
}

impl AdGate {
    #[must_use]
    pub fn new(
        host: Arc<dyn PageHost>,
        config: ResolvedConfig,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let session = PageSession::new(host.current_path());
        Self {
            host,
            config,
            telemetry,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &PageSession {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Classify, detect, decide, report, then either navigate or sync the
    /// page. Runs once per session.
    pub async fn on_page_load(&mut self) -> Result<PageLoadOutcome, GateError> {
        let context = classify(&self.host.environment());
        self.session.begin(context)?;
        let path = self.session.path().to_string();
        tracing::info!(
            %path,
            device = ?context.device_class,
            browser = ?context.browser_identity,
            "Starting detection"
        );

        let detection = self.detect(self.config.primary_timeout).await;
        let verdict = decide(context, &detection.first_party, &detection.third_party);

        self.telemetry.report(tracking_report(verdict.blocked, &path));
        let ui_state = self.sync_ui(&verdict);

        let mut outcome = PageLoadOutcome {
            path,
            context,
            verdict,
            ui_state,
            first_party: RunSummary::from(&detection.first_party),
            third_party: RunSummary::from(&detection.third_party),
            navigation: None,
            cosmetic: None,
        };

        if let Transition::Navigate { from, target } =
            self.session.transition(&outcome.verdict, Duration::ZERO)
        {
            tracing::info!(?from, %target, "Navigating to counterpart variant");
            self.host.navigate(&target);
            outcome.navigation = Some(target);
            return Ok(outcome);
        }

        if !outcome.verdict.blocked {
            let hide_containers = cosmetic::hides_containers(&outcome.path, &outcome.verdict);
            outcome.cosmetic = Some(filter::apply(self.host.as_ref(), hide_containers));
        }
        Ok(outcome)
    }

    /// User-triggered re-run with the shorter deadline.
    ///
    /// `Ok(None)` when the page has already navigated away.
    pub async fn recheck(&mut self) -> Result<Option<RecheckOutcome>, GateError> {
        let context = match self.session.recheck_context() {
            Ok(context) => context,
            Err(SessionError::NavigationIssued { target }) => {
                tracing::debug!(%target, "Recheck ignored, navigation already issued");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let detection = self.detect(self.config.recheck_timeout).await;
        let verdict = decide(context, &detection.first_party, &detection.third_party);
        let ui_state = self.sync_ui(&verdict);
        tracing::info!(blocked = verdict.blocked, "Recheck finished");

        let mut outcome = RecheckOutcome {
            verdict,
            ui_state,
            first_party: RunSummary::from(&detection.first_party),
            third_party: RunSummary::from(&detection.third_party),
            navigation: None,
            feedback: None,
        };

        if outcome.verdict.blocked {
            self.host.show_feedback(STILL_BLOCKED_FEEDBACK);
            outcome.feedback = Some(STILL_BLOCKED_FEEDBACK.to_string());
            return Ok(Some(outcome));
        }

        let delay = self.config.recheck_navigation_delay;
        if let Transition::Navigate { target, .. } =
            self.session.transition(&outcome.verdict, delay)
        {
            tracing::info!(
                %target,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Blocking lifted, returning to clean variant"
            );
            tokio::time::sleep(delay).await;
            self.host.navigate(&target);
            outcome.navigation = Some(target);
        }
        Ok(Some(outcome))
    }

    async fn detect(&mut self, timeout: Duration) -> Detection {
        detect(
            self.host.as_ref(),
            &self.config.targets,
            &mut self.session,
            timeout,
        )
        .await
    }

    fn sync_ui(&mut self, verdict: &Verdict) -> UiState {
        let state = verdict.ui_state();
        self.host.set_ui_state(state);
        self.session.record_ui_state(state);
        state
    }
}
