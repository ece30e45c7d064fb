//! Probe identities and tri-state outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One detection technique.
///
/// Each probe contributes at most one outcome per detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeId {
    /// Off-screen elements carrying filter-list class names.
    BaitElements,
    /// Same-origin image under the conventional ad path.
    ImageResource,
    /// Same-origin script under the conventional ad path.
    ScriptResource,
    /// `HEAD` request to the conventional ad path.
    FetchHead,
    /// Image loads against well-known ad-serving hosts.
    VendorResources,
    /// Globals injected by blocker extensions.
    ExtensionGlobals,
    /// Single `adsbox` element checked synchronously for `display:none`.
    AdsboxBait,
}

impl ProbeId {
    /// Probes of the first-party run, in launch order.
    pub const FIRST_PARTY: &'static [ProbeId] = &[
        ProbeId::BaitElements,
        ProbeId::ImageResource,
        ProbeId::ScriptResource,
        ProbeId::FetchHead,
    ];

    /// Probes of the third-party run, in launch order.
    pub const THIRD_PARTY: &'static [ProbeId] = &[
        ProbeId::ExtensionGlobals,
        ProbeId::AdsboxBait,
        ProbeId::VendorResources,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaitElements => "bait_elements",
            Self::ImageResource => "image_resource",
            Self::ScriptResource => "script_resource",
            Self::FetchHead => "fetch_head",
            Self::VendorResources => "vendor_resources",
            Self::ExtensionGlobals => "extension_globals",
            Self::AdsboxBait => "adsbox_bait",
        }
    }

    /// Bait elements are inspected when the run settles rather than racing
    /// the deadline.
    #[must_use]
    pub const fn measured_at_settle(self) -> bool {
        matches!(self, Self::BaitElements)
    }

    /// Which run this probe belongs to.
    #[must_use]
    pub const fn run_kind(self) -> RunKind {
        match self {
            Self::BaitElements | Self::ImageResource | Self::ScriptResource | Self::FetchHead => {
                RunKind::FirstParty
            }
            Self::VendorResources | Self::ExtensionGlobals | Self::AdsboxBait => {
                RunKind::ThirdParty
            }
        }
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two independent runs that feed one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Bait elements plus same-origin image, script and fetch probes.
    FirstParty,
    /// Vendor hosts, extension globals and the adsbox bait.
    ThirdParty,
}

impl RunKind {
    /// Probe set launched for this run.
    #[must_use]
    pub const fn probes(self) -> &'static [ProbeId] {
        match self {
            Self::FirstParty => ProbeId::FIRST_PARTY,
            Self::ThirdParty => ProbeId::THIRD_PARTY,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstParty => "first_party",
            Self::ThirdParty => "third_party",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state probe outcome.
///
/// A probe that misses the run deadline is `Inconclusive`, never `Clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Blocked,
    Clear,
    Inconclusive,
}

impl ProbeOutcome {
    #[must_use]
    pub const fn from_blocked(blocked: bool) -> Self {
        if blocked { Self::Blocked } else { Self::Clear }
    }

    /// Only positive evidence counts; `Inconclusive` is not blocked.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }

    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Inconclusive)
    }
}

/// Outcome of one probe within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: ProbeId,
    pub outcome: ProbeOutcome,
}

/// Bait elements inserted versus bait elements found hidden at settle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaitTally {
    pub inserted: u32,
    pub hidden: u32,
}

impl BaitTally {
    /// At least one bait was hidden (weak signal).
    #[must_use]
    pub const fn any_hidden(self) -> bool {
        self.hidden >= 1
    }

    /// Two or more baits were hidden (strong signal).
    #[must_use]
    pub const fn multiple_hidden(self) -> bool {
        self.hidden >= 2
    }
}
