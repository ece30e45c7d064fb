//! Device and browser classification.
//!
//! Signature lists are data, not conditionals: each list is a [`SignatureTable`]
//! that can be tested on its own. [`classify`] is the only consumer.

use std::sync::OnceLock;

use adgate_types::{BrowserIdentity, DeviceClass, EnvironmentSnapshot, ExecutionContext};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// User-agent fragments of phones and tablets (matched case-insensitively).
pub const MOBILE_UA_SIGNATURES: &[&str] = &[
    "Android",
    "webOS",
    "iPhone",
    "iPad",
    "iPod",
    "BlackBerry",
    "IEMobile",
    "Opera Mini",
];

/// User-agent fragments of browsers with built-in blocking.
pub const PRIVACY_BROWSER_UA_SIGNATURES: &[&str] = &["Brave"];

/// Runtime extension ids exposed by browsers with built-in blocking.
pub const PRIVACY_BROWSER_EXTENSION_IDS: &[&str] = &["mnojpmjdmbbfmejpflffifhclcmipmro"];

/// User-agent fragments of browsers known to ship no blocker.
pub const STANDARD_BROWSER_UA_SIGNATURES: &[&str] = &["Chrome"];

/// Viewports at or below this width count as mobile even on a desktop agent.
pub const DESKTOP_MIN_VIEWPORT_EXCLUSIVE: u32 = 768;

/// Substring matcher over a fixed list of signatures.
pub struct SignatureTable {
    patterns: &'static [&'static str],
    case_insensitive: bool,
    automaton: Option<AhoCorasick>,
}

impl std::fmt::Debug for SignatureTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureTable")
            .field("patterns", &self.patterns)
            .field("case_insensitive", &self.case_insensitive)
            .finish_non_exhaustive()
    }
}

impl SignatureTable {
    #[must_use]
    pub fn new(patterns: &'static [&'static str], case_insensitive: bool) -> Self {
        let automaton = match AhoCorasickBuilder::new()
            .ascii_case_insensitive(case_insensitive)
            .match_kind(MatchKind::LeftmostFirst)
            .build(patterns)
        {
            Ok(ac) => Some(ac),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to build signature automaton, using linear scan"
                );
                None
            }
        };
        Self {
            patterns,
            case_insensitive,
            automaton,
        }
    }

    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        if let Some(ac) = &self.automaton {
            return ac.is_match(haystack);
        }
        if self.case_insensitive {
            let lower = haystack.to_ascii_lowercase();
            self.patterns
                .iter()
                .any(|p| lower.contains(&p.to_ascii_lowercase()))
        } else {
            self.patterns.iter().any(|p| haystack.contains(p))
        }
    }
}

fn mobile_table() -> &'static SignatureTable {
    static TABLE: OnceLock<SignatureTable> = OnceLock::new();
    TABLE.get_or_init(|| SignatureTable::new(MOBILE_UA_SIGNATURES, true))
}

fn privacy_table() -> &'static SignatureTable {
    static TABLE: OnceLock<SignatureTable> = OnceLock::new();
    TABLE.get_or_init(|| SignatureTable::new(PRIVACY_BROWSER_UA_SIGNATURES, false))
}

fn standard_table() -> &'static SignatureTable {
    static TABLE: OnceLock<SignatureTable> = OnceLock::new();
    TABLE.get_or_init(|| SignatureTable::new(STANDARD_BROWSER_UA_SIGNATURES, false))
}

/// Derive the execution context for one page load.
#[must_use]
pub fn classify(env: &EnvironmentSnapshot) -> ExecutionContext {
    let context = ExecutionContext::new(device_class(env), browser_identity(env));
    tracing::debug!(
        device = ?context.device_class,
        browser = ?context.browser_identity,
        viewport = env.viewport_width,
        "Classified execution context"
    );
    context
}

#[must_use]
pub fn device_class(env: &EnvironmentSnapshot) -> DeviceClass {
    if mobile_table().matches(&env.user_agent) {
        return DeviceClass::Mobile;
    }
    if env.viewport_width > DESKTOP_MIN_VIEWPORT_EXCLUSIVE {
        DeviceClass::Desktop
    } else {
        DeviceClass::Mobile
    }
}

#[must_use]
pub fn browser_identity(env: &EnvironmentSnapshot) -> BrowserIdentity {
    if is_privacy_browser(env) {
        BrowserIdentity::PrivacyBrowser
    } else if standard_table().matches(&env.user_agent) {
        BrowserIdentity::StandardBrowser
    } else {
        BrowserIdentity::Other
    }
}

/// Brand API, user-agent token, or a known built-in extension id.
#[must_use]
pub fn is_privacy_browser(env: &EnvironmentSnapshot) -> bool {
    env.privacy_api_present
        || privacy_table().matches(&env.user_agent)
        || env
            .runtime_extension_id
            .as_deref()
            .is_some_and(|id| PRIVACY_BROWSER_EXTENSION_IDS.contains(&id))
}
