//! Detection run ledger.
//!
//! A run collects one outcome per probe until it is settled, either because
//! every probe reported or because the deadline fired. Settling is one-way:
//! after it, [`DetectionRun::record`] is a no-op.

use std::collections::BTreeMap;
use std::time::Duration;

use adgate_types::{BaitTally, ProbeId, ProbeOutcome, ProbeResult, RunId, RunKind};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct DetectionRun {
    run_id: RunId,
    kind: RunKind,
    started_at: DateTime<Utc>,
    timeout: Duration,
    results: BTreeMap<ProbeId, ProbeOutcome>,
    bait: Option<BaitTally>,
    settled: bool,
}

impl DetectionRun {
    #[must_use]
    pub fn new(run_id: RunId, kind: RunKind, timeout: Duration) -> Self {
        Self {
            run_id,
            kind,
            started_at: Utc::now(),
            timeout,
            results: BTreeMap::new(),
            bait: None,
            settled: false,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Record a probe outcome.
    ///
    /// Returns `false` (and records nothing) when the run is already settled,
    /// the probe does not belong to this run, or the probe already reported.
    pub fn record(&mut self, probe: ProbeId, outcome: ProbeOutcome) -> bool {
        if self.settled {
            tracing::debug!(run = %self.run_id, %probe, "Discarding late probe result");
            return false;
        }
        if probe.run_kind() != self.kind || self.results.contains_key(&probe) {
            return false;
        }
        tracing::debug!(run = %self.run_id, %probe, ?outcome, "Probe reported");
        self.results.insert(probe, outcome);
        true
    }

    /// Every raced probe of this run has reported.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.kind
            .probes()
            .iter()
            .filter(|probe| !probe.measured_at_settle())
            .all(|probe| self.results.contains_key(probe))
    }

    /// Seal the run. Probes that never reported become `Inconclusive`.
    ///
    /// `bait` is the tally measured at this instant; it only applies to a
    /// first-party run. Returns `false` if the run was already settled.
    pub fn settle(&mut self, bait: Option<BaitTally>) -> bool {
        if self.settled {
            return false;
        }
        if self.kind == RunKind::FirstParty
            && let Some(tally) = bait
        {
            self.bait = Some(tally);
            self.results
                .entry(ProbeId::BaitElements)
                .or_insert(ProbeOutcome::from_blocked(tally.any_hidden()));
        }
        for probe in self.kind.probes() {
            self.results
                .entry(*probe)
                .or_insert(ProbeOutcome::Inconclusive);
        }
        self.settled = true;
        tracing::debug!(
            run = %self.run_id,
            kind = %self.kind,
            blocked = self.blocked_count(),
            inconclusive = self.inconclusive_count(),
            "Detection run settled"
        );
        true
    }

    /// Outcome for a probe; `Inconclusive` if it has not reported.
    #[must_use]
    pub fn outcome(&self, probe: ProbeId) -> ProbeOutcome {
        self.results
            .get(&probe)
            .copied()
            .unwrap_or(ProbeOutcome::Inconclusive)
    }

    #[must_use]
    pub fn bait(&self) -> BaitTally {
        self.bait.unwrap_or_default()
    }

    pub fn results(&self) -> impl Iterator<Item = ProbeResult> + '_ {
        self.results.iter().map(|(probe, outcome)| ProbeResult {
            probe: *probe,
            outcome: *outcome,
        })
    }

    /// Probes that produced positive evidence.
    pub fn blocked_probes(&self) -> impl Iterator<Item = ProbeId> + '_ {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.is_blocked())
            .map(|(probe, _)| *probe)
    }

    #[must_use]
    pub fn any_blocked(&self) -> bool {
        self.blocked_probes().next().is_some()
    }

    fn blocked_count(&self) -> usize {
        self.blocked_probes().count()
    }

    fn inconclusive_count(&self) -> usize {
        self.results.values().filter(|o| !o.is_settled()).count()
    }
}
