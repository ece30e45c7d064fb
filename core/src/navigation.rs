//! Clean / ad-dense path mapping and the navigation transition function.
//!
//! The mapping is a bijection over [`SECTION_PAIRS`] plus the parametrised
//! match pages. Anything else falls back to the homepage of the other variant.

use adgate_types::{Variant, Verdict};

/// Exact clean ↔ ad-dense pairs.
pub const SECTION_PAIRS: &[(&str, &str)] = &[
    ("/", "/homepageadblock"),
    ("/football", "/footballadblock"),
    ("/basketball", "/basketballadblock"),
    ("/tennis", "/tennisadblock"),
    ("/ufc", "/ufcadblock"),
    ("/rugby", "/rugbyadblock"),
    ("/baseball", "/baseballadblock"),
];

pub const MATCH_CLEAN_PREFIX: &str = "/match/";
pub const MATCH_DENSE_PREFIX: &str = "/matchadblock/";

/// Where an unrecognised clean path goes when blocked.
pub const DEFAULT_DENSE_PATH: &str = "/homepageadblock";
/// Where an unrecognised ad-dense path goes when not blocked.
pub const DEFAULT_CLEAN_PATH: &str = "/";

const DENSE_MARKER: &str = "adblock";

/// Variant a path belongs to.
#[must_use]
pub fn variant_of(path: &str) -> Variant {
    if path.contains(DENSE_MARKER) {
        Variant::AdDense
    } else {
        Variant::Clean
    }
}

/// Ad-dense counterpart of a clean path.
///
/// Sections match exactly, so a sub-path such as `/football/fixtures` is
/// unmapped and falls back to [`DEFAULT_DENSE_PATH`] rather than its
/// section's page. Only exact sections round-trip through [`clean_path_for`].
#[must_use]
pub fn dense_path_for(clean: &str) -> String {
    if let Some(id) = clean.strip_prefix(MATCH_CLEAN_PREFIX) {
        return format!("{MATCH_DENSE_PREFIX}{id}");
    }
    let key = normalize_section(clean);
    SECTION_PAIRS
        .iter()
        .find(|(c, _)| *c == key)
        .map_or(DEFAULT_DENSE_PATH, |(_, d)| *d)
        .to_string()
}

/// Clean counterpart of an ad-dense path.
#[must_use]
pub fn clean_path_for(dense: &str) -> String {
    if let Some(id) = dense.strip_prefix(MATCH_DENSE_PREFIX) {
        return format!("{MATCH_CLEAN_PREFIX}{id}");
    }
    let key = normalize_section(dense);
    SECTION_PAIRS
        .iter()
        .find(|(_, d)| *d == key)
        .map_or(DEFAULT_CLEAN_PATH, |(c, _)| *c)
        .to_string()
}

/// `/football/` and `/football` are the same section.
fn normalize_section(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Result of the transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The page already matches the verdict.
    Stay,
    /// Leave for `target`; nothing else runs for this load.
    Navigate { from: Variant, target: String },
}

impl Transition {
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Stay => None,
            Self::Navigate { target, .. } => Some(target),
        }
    }
}

/// Pure transition function.
///
/// Never targets the variant the page is already on.
#[must_use]
pub fn next(current_path: &str, verdict: &Verdict) -> Transition {
    let current = variant_of(current_path);
    let wanted = Variant::wanted_for(verdict.blocked);
    if current == wanted {
        return Transition::Stay;
    }
    let target = match current {
        Variant::Clean => dense_path_for(current_path),
        Variant::AdDense => clean_path_for(current_path),
    };
    Transition::Navigate {
        from: current,
        target,
    }
}
