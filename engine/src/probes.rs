//! Individual signal probes.
//!
//! Every probe fails closed: a load that errors is evidence of blocking.
//! Probes never return errors of their own; DOM trouble is logged and the
//! affected probe simply stays unreported.

use adgate_types::{BaitTally, ElementSpec, ProbeOutcome};
use futures_util::future::join_all;

use crate::host::PageHost;
use crate::scoped::ScopedElement;

/// Class sets of the first-party bait elements, one element each.
pub const BAIT_CLASS_SETS: &[&str] = &[
    "ads ad adsbox sponsor advertisement ad-banner",
    "advertisement ads ad-banner",
    "adsbox ad-container",
    "sponsored-content ad",
];

/// Off-screen but laid out: only a cosmetic rule can hide it.
pub const BAIT_STYLE: &str = "position:absolute; left:-9999px; width:1px; height:1px;";

pub const BAIT_ID_PREFIX: &str = "ad-bait-";

pub const ADSBOX_DOM_ID: &str = "adsbox-bait";
pub const ADSBOX_CLASS: &str = "adsbox";

/// Globals injected by common blocking extensions.
pub const EXTENSION_GLOBALS: &[&str] = &["adblockplus", "ubo", "adguard", "ghostery"];

fn bait_spec(index: usize, class_names: &str) -> ElementSpec {
    ElementSpec::Bait {
        dom_id: format!("{BAIT_ID_PREFIX}{index}"),
        class_names: class_names.to_string(),
        style: BAIT_STYLE.to_string(),
    }
}

/// The first-party bait elements, alive until dropped.
pub(crate) struct BaitSet<'h> {
    host: &'h dyn PageHost,
    elements: Vec<ScopedElement<'h>>,
}

impl<'h> BaitSet<'h> {
    pub(crate) fn insert(host: &'h dyn PageHost) -> Self {
        let elements = BAIT_CLASS_SETS
            .iter()
            .enumerate()
            .filter_map(|(index, classes)| {
                match ScopedElement::insert(host, &bait_spec(index, classes)) {
                    Ok(element) => Some(element),
                    Err(e) => {
                        tracing::warn!(index, error = %e, "Failed to insert bait element");
                        None
                    }
                }
            })
            .collect();
        Self { host, elements }
    }

    /// Count hidden elements as of now.
    ///
    /// An element whose visibility cannot be read is not counted as hidden.
    pub(crate) fn tally(&self) -> BaitTally {
        let mut hidden = 0;
        for element in &self.elements {
            match self.host.inspect_visibility(element.id()) {
                Ok(visibility) if visibility.is_hidden() => hidden += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        element = %element.id(),
                        error = %e,
                        "Failed to inspect bait element"
                    );
                }
            }
        }
        BaitTally {
            inserted: self.elements.len() as u32,
            hidden,
        }
    }
}

/// Append a `ts` query parameter so no cache answers for the blocker.
pub(crate) fn cache_busted(path: &str, millis: i64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}ts={millis}")
}

pub(crate) async fn image_probe(host: &dyn PageHost, url: String) -> ProbeOutcome {
    let result = host.load_image(&url).await;
    if let Err(e) = &result {
        tracing::debug!(%url, error = %e, "Image probe failed to load");
    }
    ProbeOutcome::from_blocked(result.is_err())
}

/// Awaits the already-inserted script element.
pub(crate) async fn script_probe(host: &dyn PageHost, script: &ScopedElement<'_>) -> ProbeOutcome {
    let result = host.script_settled(script.id()).await;
    if let Err(e) = &result {
        tracing::debug!(element = %script.id(), error = %e, "Script probe failed to load");
    }
    ProbeOutcome::from_blocked(result.is_err())
}

pub(crate) fn script_spec(url: String) -> ElementSpec {
    ElementSpec::Script { src: url }
}

pub(crate) async fn fetch_probe(host: &dyn PageHost, url: String) -> ProbeOutcome {
    let result = host.fetch_head(&url).await;
    if let Err(e) = &result {
        tracing::debug!(%url, error = %e, "Fetch probe rejected");
    }
    ProbeOutcome::from_blocked(result.is_err())
}

/// Blocked when a strict majority of vendor resources fail.
pub(crate) async fn vendor_probe(host: &dyn PageHost, urls: &[String]) -> ProbeOutcome {
    let results = join_all(urls.iter().map(|url| host.load_image(url))).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::debug!(failed, total = urls.len(), "Vendor probe finished");
    ProbeOutcome::from_blocked(failed * 2 > urls.len())
}

pub(crate) fn extension_globals_probe(host: &dyn PageHost) -> ProbeOutcome {
    let found = EXTENSION_GLOBALS.iter().find(|name| host.has_global(name));
    if let Some(name) = found {
        tracing::debug!(global = name, "Blocker global present");
    }
    ProbeOutcome::from_blocked(found.is_some())
}

/// Single `adsbox` element, read right after insertion and removed.
pub(crate) fn adsbox_probe(host: &dyn PageHost) -> ProbeOutcome {
    let spec = ElementSpec::Bait {
        dom_id: ADSBOX_DOM_ID.to_string(),
        class_names: ADSBOX_CLASS.to_string(),
        style: BAIT_STYLE.to_string(),
    };
    let element = match ScopedElement::insert(host, &spec) {
        Ok(element) => element,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to insert adsbox bait");
            return ProbeOutcome::Inconclusive;
        }
    };
    match host.inspect_visibility(element.id()) {
        Ok(visibility) => ProbeOutcome::from_blocked(visibility.display_none),
        Err(e) => {
            tracing::warn!(element = %element.id(), error = %e, "Failed to inspect adsbox bait");
            ProbeOutcome::Inconclusive
        }
    }
}
