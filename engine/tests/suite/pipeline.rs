//! Page-load pipeline scenarios.

use std::collections::BTreeSet;

use adgate_core::SessionError;
use adgate_engine::{GateError, PageScript};
use adgate_types::{BrowserIdentity, DeviceClass, ProbeId, UiState};

use crate::common::{
    desktop_chrome, harness, mobile_safari, privacy_browser, script, strings,
};

#[tokio::test(start_paused = true)]
async fn desktop_all_clear_stays_and_marks_clean() {
    let mut h = harness(script("/football", desktop_chrome()));

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(!outcome.verdict.blocked);
    assert!(outcome.verdict.contributing_signals.is_empty());
    assert_eq!(outcome.context.device_class, DeviceClass::Desktop);
    assert_eq!(outcome.context.browser_identity, BrowserIdentity::StandardBrowser);
    assert_eq!(outcome.navigation, None);
    assert_eq!(outcome.ui_state, UiState::AdblockOff);
    assert_eq!(h.page.ui_states(), vec![UiState::AdblockOff]);
    assert!(h.page.navigations().is_empty());
    assert!(outcome.cosmetic.is_some());
}

#[tokio::test(start_paused = true)]
async fn desktop_two_hidden_baits_navigate_to_dense_section() {
    let mut h = harness(PageScript {
        // Hides ad-bait-0 and ad-bait-1 only.
        hidden_classes: strings(&["ad-banner"]),
        ..script("/football", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(outcome.verdict.blocked);
    assert_eq!(
        outcome.verdict.contributing_signals,
        BTreeSet::from([ProbeId::BaitElements])
    );
    assert_eq!(outcome.first_party.bait.map(|b| b.hidden), Some(2));
    assert_eq!(outcome.navigation.as_deref(), Some("/footballadblock"));
    assert_eq!(h.page.navigations(), vec!["/footballadblock".to_string()]);
    assert_eq!(h.page.ui_states(), vec![UiState::AdblockOn]);
    assert!(outcome.cosmetic.is_none());
    assert!(h.gate.session().is_halted());
}

#[tokio::test(start_paused = true)]
async fn mobile_bait_with_image_failure_navigates_home() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["sponsored-content"]),
        blocked_urls: strings(&["/ads/ad.gif"]),
        ..script("/", mobile_safari())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert_eq!(outcome.context.device_class, DeviceClass::Mobile);
    assert!(outcome.verdict.blocked);
    assert_eq!(
        outcome.verdict.contributing_signals,
        BTreeSet::from([ProbeId::BaitElements, ProbeId::ImageResource])
    );
    assert_eq!(h.page.navigations(), vec!["/homepageadblock".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn desktop_single_bait_is_not_enough() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["sponsored-content"]),
        ..script("/tennis", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(!outcome.verdict.blocked);
    assert!(
        outcome
            .verdict
            .contributing_signals
            .contains(&ProbeId::BaitElements)
    );
    assert!(h.page.navigations().is_empty());
    assert_eq!(h.page.ui_states(), vec![UiState::AdblockOff]);
}

#[tokio::test(start_paused = true)]
async fn fetch_rejection_alone_blocks_desktop() {
    let mut h = harness(PageScript {
        // Fails the script element and the HEAD request for it.
        blocked_urls: strings(&["/ads/test.js"]),
        ..script("/rugby", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(outcome.verdict.blocked);
    assert!(
        outcome
            .verdict
            .contributing_signals
            .contains(&ProbeId::FetchHead)
    );
    assert_eq!(h.page.navigations(), vec!["/rugbyadblock".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn privacy_browser_with_one_third_party_signal_is_blocked() {
    let mut h = harness(PageScript {
        globals: strings(&["adguard"]),
        ..script("/", privacy_browser())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert_eq!(
        outcome.context.browser_identity,
        BrowserIdentity::PrivacyBrowser
    );
    assert!(outcome.verdict.blocked);
    assert_eq!(
        outcome.verdict.contributing_signals,
        BTreeSet::from([ProbeId::ExtensionGlobals])
    );
    assert_eq!(h.page.navigations(), vec!["/homepageadblock".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn privacy_browser_with_both_runs_clear_is_not_blocked() {
    let mut h = harness(script("/homepageadblock", privacy_browser()));

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(!outcome.verdict.blocked);
    assert_eq!(h.page.navigations(), vec!["/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn dense_page_with_blocker_stays_put() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["ad-banner"]),
        ..script("/matchadblock/42", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(outcome.verdict.blocked);
    assert_eq!(outcome.navigation, None);
    assert_eq!(outcome.ui_state, UiState::AdblockOn);
    assert!(outcome.cosmetic.is_none());
    assert!(!h.gate.session().is_halted());
}

#[tokio::test(start_paused = true)]
async fn telemetry_reports_once_with_page_path() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["ad-banner"]),
        ..script("/basketball", desktop_chrome())
    });

    h.gate.on_page_load().await.unwrap();

    let reports = h.telemetry.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].adblock);
    assert_eq!(reports[0].page, "/basketball");
    assert!(reports[0].timestamp.ends_with('Z'));
}

#[tokio::test(start_paused = true)]
async fn second_page_load_is_rejected() {
    let mut h = harness(script("/", desktop_chrome()));

    h.gate.on_page_load().await.unwrap();
    let err = h.gate.on_page_load().await.unwrap_err();

    assert!(matches!(
        err,
        GateError::Session(SessionError::AlreadyInitialized)
    ));
    assert_eq!(h.page.ui_states().len(), 1);
    assert_eq!(h.telemetry.reports().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cosmetic_filter_hides_known_frames_and_labels() {
    let mut h = harness(PageScript {
        frames: strings(&[
            "https://www.otieu.com/4/9912",
            "https://www.youtube.com/embed/xyz",
            "//tzegilo.com/slot?id=3",
        ]),
        labels: vec![
            adgate_engine::ScriptedText {
                tag: "P".to_string(),
                text: " Advertisement ".to_string(),
            },
            adgate_engine::ScriptedText {
                tag: "h2".to_string(),
                text: "Advertisement".to_string(),
            },
            adgate_engine::ScriptedText {
                tag: "span".to_string(),
                text: "Latest scores".to_string(),
            },
        ],
        dom_ids: strings(&["adblock-provider-script"]),
        ..script("/", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();
    let cosmetic = outcome.cosmetic.unwrap();

    assert_eq!(cosmetic.hidden_containers, 3);
    assert!(cosmetic.provider_script_removed);
    assert_eq!(h.page.hidden_containers().len(), 3);
    assert_eq!(
        h.page.removed_dom_ids(),
        vec!["adblock-provider-script".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn match_page_keeps_ad_containers_but_drops_provider_script() {
    let mut h = harness(PageScript {
        frames: strings(&["https://www.otieu.com/4/9912"]),
        dom_ids: strings(&["adblock-provider-script"]),
        ..script("/match/42", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(!outcome.verdict.blocked);
    assert_eq!(outcome.navigation, None);
    let cosmetic = outcome.cosmetic.unwrap();
    assert_eq!(cosmetic.hidden_containers, 0);
    assert!(cosmetic.provider_script_removed);
    assert!(h.page.hidden_containers().is_empty());
    assert_eq!(
        h.page.removed_dom_ids(),
        vec!["adblock-provider-script".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn blocked_dense_page_keeps_provider_script() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["ad-banner"]),
        dom_ids: strings(&["adblock-provider-script"]),
        ..script("/matchadblock/42", desktop_chrome())
    });

    let outcome = h.gate.on_page_load().await.unwrap();

    assert!(outcome.verdict.blocked);
    assert!(outcome.cosmetic.is_none());
    assert!(h.page.removed_dom_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn probe_elements_are_removed_after_load() {
    let mut h = harness(PageScript {
        hidden_classes: strings(&["ad-banner", "adsbox"]),
        ..script("/football", desktop_chrome())
    });

    h.gate.on_page_load().await.unwrap();

    assert_eq!(h.page.live_elements(), 0);
}
