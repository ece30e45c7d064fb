//! Deadline-bounded detection runs.
//!
//! Each run polls its probes from a single `FuturesUnordered` raced against
//! one shared deadline. The run settles as soon as every raced probe has
//! reported or the deadline fires; whatever is still pending is dropped
//! unpolled. Bait and script elements are scoped to the run.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use adgate_core::{DetectionRun, PageSession};
use adgate_types::{BaitTally, ProbeId, ProbeOutcome, ProbeResult, RunId, RunKind};
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde::Serialize;
use tokio::time::Instant;

use crate::host::PageHost;
use crate::probes::{
    BaitSet, adsbox_probe, cache_busted, extension_globals_probe, fetch_probe, image_probe,
    script_probe, script_spec, vendor_probe,
};
use crate::resolved::ProbeTargets;
use crate::scoped::ScopedElement;

type ProbeFut<'a> = Pin<Box<dyn Future<Output = (ProbeId, ProbeOutcome)> + Send + 'a>>;

/// Both settled runs of one detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    pub first_party: DetectionRun,
    pub third_party: DetectionRun,
}

/// Serializable view of a settled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub kind: RunKind,
    pub started_at: String,
    pub timeout_ms: u64,
    pub results: Vec<ProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bait: Option<BaitTally>,
}

impl From<&DetectionRun> for RunSummary {
    fn from(run: &DetectionRun) -> Self {
        Self {
            run_id: run.run_id(),
            kind: run.kind(),
            started_at: run.started_at().to_rfc3339_opts(SecondsFormat::Millis, true),
            timeout_ms: u64::try_from(run.timeout().as_millis()).unwrap_or(u64::MAX),
            results: run.results().collect(),
            bait: (run.kind() == RunKind::FirstParty).then(|| run.bait()),
        }
    }
}

/// Run both probe groups concurrently against one deadline.
pub async fn detect(
    host: &dyn PageHost,
    targets: &ProbeTargets,
    session: &mut PageSession,
    timeout: Duration,
) -> Detection {
    let first_id = session.allocate_run();
    let third_id = session.allocate_run();
    let deadline = Instant::now() + timeout;

    let (first_party, third_party) = tokio::join!(
        run_first_party(host, targets, first_id, timeout, deadline),
        run_third_party(host, targets, third_id, timeout, deadline),
    );

    Detection {
        first_party,
        third_party,
    }
}

pub async fn run_first_party(
    host: &dyn PageHost,
    targets: &ProbeTargets,
    run_id: RunId,
    timeout: Duration,
    deadline: Instant,
) -> DetectionRun {
    let mut run = DetectionRun::new(run_id, RunKind::FirstParty, timeout);
    let millis = Utc::now().timestamp_millis();

    let bait = BaitSet::insert(host);
    let script = match ScopedElement::insert(
        host,
        &script_spec(cache_busted(&targets.script_path, millis)),
    ) {
        Ok(element) => Some(element),
        Err(e) => {
            tracing::warn!(run = %run_id, error = %e, "Failed to insert probe script");
            None
        }
    };

    let pending: FuturesUnordered<ProbeFut<'_>> = FuturesUnordered::new();
    let image_url = cache_busted(&targets.image_path, millis);
    pending.push(Box::pin(async move {
        (ProbeId::ImageResource, image_probe(host, image_url).await)
    }));
    if let Some(script) = &script {
        pending.push(Box::pin(async move {
            (ProbeId::ScriptResource, script_probe(host, script).await)
        }));
    }
    let fetch_url = cache_busted(&targets.script_path, millis);
    pending.push(Box::pin(async move {
        (ProbeId::FetchHead, fetch_probe(host, fetch_url).await)
    }));

    race(&mut run, pending, deadline).await;

    let tally = bait.tally();
    run.settle((tally.inserted > 0).then_some(tally));
    run
}

pub async fn run_third_party(
    host: &dyn PageHost,
    targets: &ProbeTargets,
    run_id: RunId,
    timeout: Duration,
    deadline: Instant,
) -> DetectionRun {
    let mut run = DetectionRun::new(run_id, RunKind::ThirdParty, timeout);

    run.record(ProbeId::ExtensionGlobals, extension_globals_probe(host));
    run.record(ProbeId::AdsboxBait, adsbox_probe(host));

    let pending: FuturesUnordered<ProbeFut<'_>> = FuturesUnordered::new();
    let urls = targets.vendor_urls.as_slice();
    pending.push(Box::pin(async move {
        (ProbeId::VendorResources, vendor_probe(host, urls).await)
    }));

    race(&mut run, pending, deadline).await;

    run.settle(None);
    run
}

/// Record outcomes until the run is complete, the probes run out, or the
/// deadline passes. Consumes the pending set so late futures are dropped.
async fn race(
    run: &mut DetectionRun,
    mut pending: FuturesUnordered<ProbeFut<'_>>,
    deadline: Instant,
) {
    while !run.is_complete() {
        match tokio::time::timeout_at(deadline, pending.next()).await {
            Ok(Some((probe, outcome))) => {
                run.record(probe, outcome);
            }
            Ok(None) => break,
            Err(_) => {
                tracing::debug!(
                    run = %run.run_id(),
                    pending = pending.len(),
                    "Deadline reached before all probes reported"
                );
                break;
            }
        }
    }
}
