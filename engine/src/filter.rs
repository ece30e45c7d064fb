//! Cosmetic pass for visitors who are not blocking.
//!
//! The provider script goes on every such load. Container hiding is left
//! out on match pages.

use adgate_core::cosmetic::{
    CONTAINER_SELECTOR, LABEL_TAGS, PROVIDER_SCRIPT_ID, is_ad_frame, is_ad_label,
};
use adgate_types::ElementId;
use serde::Serialize;

use crate::host::PageHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CosmeticReport {
    pub hidden_containers: usize,
    pub provider_script_removed: bool,
}

/// Drop the provider script, then hide ad-frame and ad-label containers
/// when `hide_containers` is set.
pub(crate) fn apply(host: &dyn PageHost, hide_containers: bool) -> CosmeticReport {
    let provider_script_removed = remove_provider_script(host);
    let hidden_containers = if hide_containers {
        hide_ad_containers(host)
    } else {
        0
    };

    tracing::debug!(hidden_containers, provider_script_removed, "Cosmetic filter applied");
    CosmeticReport {
        hidden_containers,
        provider_script_removed,
    }
}

fn remove_provider_script(host: &dyn PageHost) -> bool {
    match host.remove_by_dom_id(PROVIDER_SCRIPT_ID) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(
                dom_id = PROVIDER_SCRIPT_ID,
                error = %e,
                "Failed to remove provider script"
            );
            false
        }
    }
}

fn hide_ad_containers(host: &dyn PageHost) -> usize {
    let frame_hits = host
        .ad_frames()
        .into_iter()
        .filter(|frame| is_ad_frame(&frame.src))
        .map(|frame| frame.element);
    let label_hits = host
        .labelled_elements()
        .into_iter()
        .filter(|el| LABEL_TAGS.iter().any(|tag| el.tag.eq_ignore_ascii_case(tag)))
        .filter(|el| is_ad_label(&el.text))
        .map(|el| el.element);

    frame_hits
        .chain(label_hits)
        .filter(|id| hide(host, *id))
        .count()
}

fn hide(host: &dyn PageHost, id: ElementId) -> bool {
    match host.hide_container(id, CONTAINER_SELECTOR) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(element = %id, error = %e, "Failed to hide ad container");
            false
        }
    }
}
