//! Signal aggregation and the context-keyed decision policy.
//!
//! | Context | Blocked when |
//! |---|---|
//! | privacy browser | always, unless both runs are all-clear |
//! | desktop | `multiple_bait` OR (`bait` AND `image` AND `script`) OR `fetch` OR any third-party signal |
//! | mobile | `multiple_bait` OR (`bait` AND (`image` OR `script`)) OR `fetch` OR any third-party signal |
//!
//! Desktop needs corroboration because single network failures (proxies,
//! flaky links) are common there; mobile false positives are rare.

use std::collections::BTreeSet;

use adgate_types::{BrowserIdentity, DeviceClass, ExecutionContext, ProbeId, RunKind, Verdict};

use crate::run::DetectionRun;

/// Which row of the policy matrix applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRule {
    /// Built-in blocking is assumed on unless both runs show nothing.
    AssumeBlockedUnlessAllClear,
    /// Weak bait evidence needs image AND script corroboration.
    Corroborated,
    /// Weak bait evidence needs image OR script corroboration.
    SingleCorroboration,
}

impl PolicyRule {
    #[must_use]
    pub const fn for_context(context: ExecutionContext) -> Self {
        match (context.browser_identity, context.device_class) {
            (BrowserIdentity::PrivacyBrowser, _) => Self::AssumeBlockedUnlessAllClear,
            (BrowserIdentity::StandardBrowser | BrowserIdentity::Other, DeviceClass::Desktop) => {
                Self::Corroborated
            }
            (BrowserIdentity::StandardBrowser | BrowserIdentity::Other, DeviceClass::Mobile) => {
                Self::SingleCorroboration
            }
        }
    }
}

/// Named booleans of the first-party run, as the policy reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstPartySignals {
    pub bait_blocked: bool,
    pub multiple_bait_blocked: bool,
    pub network_blocked: bool,
    pub script_blocked: bool,
    pub fetch_blocked: bool,
}

impl FirstPartySignals {
    #[must_use]
    pub fn from_run(run: &DetectionRun) -> Self {
        debug_assert_eq!(run.kind(), RunKind::FirstParty);
        let bait = run.bait();
        Self {
            bait_blocked: run.outcome(ProbeId::BaitElements).is_blocked(),
            multiple_bait_blocked: bait.multiple_hidden(),
            network_blocked: run.outcome(ProbeId::ImageResource).is_blocked(),
            script_blocked: run.outcome(ProbeId::ScriptResource).is_blocked(),
            fetch_blocked: run.outcome(ProbeId::FetchHead).is_blocked(),
        }
    }

    /// The first-party half of `rule`.
    #[must_use]
    pub const fn satisfies(self, rule: PolicyRule) -> bool {
        let corroborated = match rule {
            PolicyRule::Corroborated => {
                self.bait_blocked && self.network_blocked && self.script_blocked
            }
            PolicyRule::SingleCorroboration => {
                self.bait_blocked && (self.network_blocked || self.script_blocked)
            }
            PolicyRule::AssumeBlockedUnlessAllClear => {
                self.bait_blocked || self.network_blocked || self.script_blocked
            }
        };
        self.multiple_bait_blocked || corroborated || self.fetch_blocked
    }
}

/// Combine both settled runs into a verdict.
///
/// Pure: identical runs and context always produce identical verdicts.
#[must_use]
pub fn decide(
    context: ExecutionContext,
    first_party: &DetectionRun,
    third_party: &DetectionRun,
) -> Verdict {
    let rule = PolicyRule::for_context(context);
    let signals = FirstPartySignals::from_run(first_party);

    let blocked = signals.satisfies(rule) || third_party.any_blocked();

    let contributing: BTreeSet<ProbeId> = first_party
        .blocked_probes()
        .chain(third_party.blocked_probes())
        .collect();

    tracing::info!(
        ?rule,
        blocked,
        bait_hidden = first_party.bait().hidden,
        signals = ?contributing,
        "Decision policy evaluated"
    );

    Verdict::new(blocked, contributing)
}
