//! Rules for the cosmetic ad-container filter.
//!
//! The filter only runs for visitors who are not blocking. Container hiding
//! never runs on match pages, which are meant to carry their ads; the
//! provider script is removed there all the same.

use adgate_types::Verdict;

use crate::navigation::MATCH_CLEAN_PREFIX;

/// Third-party iframe sources whose containers are hidden.
pub const AD_FRAME_SOURCES: &[&str] = &[
    "otieu.com",
    "madurird.com",
    "al5sm.com",
    "kt.restowelected.com",
    "np.mournersamoa.com",
    "shoukigaigoors.net",
    "tzegilo.com",
];

/// Text labels that mark an ad slot.
pub const AD_LABELS: &[&str] = &["advertisement", "advertisements"];

/// Element tags scanned for ad labels.
pub const LABEL_TAGS: &[&str] = &["p", "span", "div"];

/// Selector used to find the enclosing container of a hit.
pub const CONTAINER_SELECTOR: &str =
    "section, .bg-gray-800, .ad, .ad-slot, .ad-inline, .container, div";

/// Provider script removed for visitors who are not blocking.
pub const PROVIDER_SCRIPT_ID: &str = "adblock-provider-script";

/// Whether ad containers on `path` are hidden for a visitor with `verdict`.
#[must_use]
pub fn hides_containers(path: &str, verdict: &Verdict) -> bool {
    !verdict.blocked && !path.starts_with(MATCH_CLEAN_PREFIX)
}

#[must_use]
pub fn is_ad_frame(src: &str) -> bool {
    AD_FRAME_SOURCES.iter().any(|host| src.contains(host))
}

#[must_use]
pub fn is_ad_label(text: &str) -> bool {
    let trimmed = text.trim();
    AD_LABELS
        .iter()
        .any(|label| trimmed.eq_ignore_ascii_case(label))
}
