//! Verdicts and the values derived from them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProbeId;

/// Final classification for one page load (or one recheck).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub blocked: bool,
    /// Every probe that evaluated `Blocked`, in either run.
    pub contributing_signals: BTreeSet<ProbeId>,
}

impl Verdict {
    #[must_use]
    pub fn new(blocked: bool, contributing_signals: BTreeSet<ProbeId>) -> Self {
        Self {
            blocked,
            contributing_signals,
        }
    }

    /// A not-blocked verdict with no signals.
    #[must_use]
    pub fn clear() -> Self {
        Self::new(false, BTreeSet::new())
    }

    #[must_use]
    pub fn ui_state(&self) -> UiState {
        UiState::from_blocked(self.blocked)
    }
}

/// Process-wide marker read by banner, modal and cosmetic collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiState {
    AdblockOn,
    AdblockOff,
}

impl UiState {
    #[must_use]
    pub const fn from_blocked(blocked: bool) -> Self {
        if blocked {
            Self::AdblockOn
        } else {
            Self::AdblockOff
        }
    }

    /// Body class name for this state.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::AdblockOn => "adblock-on",
            Self::AdblockOff => "adblock-off",
        }
    }

    /// Whether the blocker banner should be displayed.
    #[must_use]
    pub const fn banner_visible(self) -> bool {
        matches!(self, Self::AdblockOn)
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Which of the two URL forms a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Clean,
    AdDense,
}

impl Variant {
    /// Variant a verdict asks for.
    #[must_use]
    pub const fn wanted_for(blocked: bool) -> Self {
        if blocked { Self::AdDense } else { Self::Clean }
    }
}

/// Payload posted to the tracking endpoint once per page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingReport {
    pub adblock: bool,
    pub page: String,
    /// ISO-8601 with millisecond precision and a `Z` suffix.
    pub timestamp: String,
}
