//! `adgate replay`: drive the real pipeline against a [`ScriptedPage`].

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use adgate_config::GateConfig;
use adgate_engine::{
    AdGate, PageLoadOutcome, PageScript, RecheckOutcome, ResolvedConfig, ScriptedPage,
    TelemetrySink,
};
use adgate_types::{TrackingReport, UiState};
use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::args::ReplayArgs;

/// Holds the reports a page load would have sent.
#[derive(Default)]
struct CapturedTelemetry {
    reports: Mutex<Vec<TrackingReport>>,
}

impl CapturedTelemetry {
    fn take(&self) -> Vec<TrackingReport> {
        std::mem::take(
            &mut *self
                .reports
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl TelemetrySink for CapturedTelemetry {
    fn report(&self, report: TrackingReport) {
        self.reports
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(report);
    }
}

/// Side effects observed on the page.
#[derive(Debug, Serialize)]
pub struct PageEffects {
    pub ui_states: Vec<UiState>,
    pub navigations: Vec<String>,
    pub feedback: Vec<String>,
    pub removed_dom_ids: Vec<String>,
    /// Probe elements still attached after the run.
    pub leaked_elements: usize,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub page_load: PageLoadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck: Option<RecheckOutcome>,
    /// Reports handed to telemetry; replay never sends them.
    pub telemetry: Vec<TrackingReport>,
    pub effects: PageEffects,
}

pub fn load_scenario(path: &Path) -> Result<PageScript> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse scenario {}", path.display()))
}

fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config = match explicit {
        Some(path) => {
            let Some(config) = GateConfig::load_from(path)? else {
                bail!("config file {} does not exist", path.display());
            };
            config
        }
        None => GateConfig::load()?.unwrap_or_default(),
    };
    Ok(ResolvedConfig::from_config(&config)?)
}

pub async fn run(args: &ReplayArgs) -> Result<ReplayReport> {
    let script = load_scenario(&args.scenario)?;
    let config = load_config(args.config.as_deref())?;
    tracing::info!(
        scenario = %args.scenario.display(),
        path = %script.path,
        "Replaying page load"
    );

    let page = Arc::new(ScriptedPage::new(script));
    let telemetry = Arc::new(CapturedTelemetry::default());
    let mut gate = AdGate::new(page.clone(), config, telemetry.clone());

    let page_load = gate.on_page_load().await?;

    let recheck = if args.recheck {
        if args.whitelist {
            page.whitelist();
        }
        gate.recheck().await?
    } else {
        None
    };

    Ok(ReplayReport {
        page_load,
        recheck,
        telemetry: telemetry.take(),
        effects: PageEffects {
            ui_states: page.ui_states(),
            navigations: page.navigations(),
            feedback: page.feedback(),
            removed_dom_ids: page.removed_dom_ids(),
            leaked_elements: page.live_elements(),
        },
    })
}
