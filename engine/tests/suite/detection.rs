//! Deadline and settle behaviour of detection runs.

use std::time::Duration;

use adgate_core::PageSession;
use adgate_engine::{PageScript, ProbeTargets, ScriptedPage, SlowUrl, detect};
use adgate_types::{ProbeId, ProbeOutcome, RunKind};
use tokio::time::Instant;

use crate::common::{desktop_chrome, harness, script, strings};

fn outcome_of(run: &adgate_core::DetectionRun, probe: ProbeId) -> ProbeOutcome {
    run.outcome(probe)
}

#[tokio::test(start_paused = true)]
async fn fast_probes_settle_before_the_deadline() {
    let page = ScriptedPage::new(PageScript {
        latency_ms: 40,
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");
    let start = Instant::now();

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    assert_eq!(start.elapsed(), Duration::from_millis(40));
    assert!(detection.first_party.is_settled());
    assert!(detection.third_party.is_settled());
    assert_eq!(detection.first_party.kind(), RunKind::FirstParty);
    for probe in ProbeId::FIRST_PARTY {
        assert_eq!(outcome_of(&detection.first_party, *probe), ProbeOutcome::Clear);
    }
}

#[tokio::test(start_paused = true)]
async fn slow_probe_times_out_as_inconclusive() {
    let page = ScriptedPage::new(PageScript {
        // Blocked, but the answer arrives after the deadline.
        blocked_urls: strings(&["googlesyndication"]),
        slow: vec![SlowUrl {
            pattern: "googlesyndication".to_string(),
            latency_ms: 5000,
        }],
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");
    let start = Instant::now();

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    assert_eq!(start.elapsed(), Duration::from_millis(1500));
    assert_eq!(
        detection.third_party.outcome(ProbeId::VendorResources),
        ProbeOutcome::Inconclusive
    );
    assert_eq!(
        detection.first_party.outcome(ProbeId::ImageResource),
        ProbeOutcome::Clear
    );

    // Letting the late load finish changes nothing.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        detection.third_party.outcome(ProbeId::VendorResources),
        ProbeOutcome::Inconclusive
    );
    assert!(!detection.third_party.any_blocked());
}

#[tokio::test(start_paused = true)]
async fn vendor_probe_needs_a_majority() {
    let one_of_three = ScriptedPage::new(PageScript {
        blocked_urls: strings(&["googlesyndication"]),
        ..script("/", desktop_chrome())
    });
    let two_of_three = ScriptedPage::new(PageScript {
        blocked_urls: strings(&["doubleclick"]),
        ..script("/", desktop_chrome())
    });
    let targets = ProbeTargets::default();
    let timeout = Duration::from_millis(1500);

    let minority = detect(&one_of_three, &targets, &mut PageSession::new("/"), timeout).await;
    let majority = detect(&two_of_three, &targets, &mut PageSession::new("/"), timeout).await;

    assert_eq!(
        minority.third_party.outcome(ProbeId::VendorResources),
        ProbeOutcome::Clear
    );
    assert_eq!(
        majority.third_party.outcome(ProbeId::VendorResources),
        ProbeOutcome::Blocked
    );
}

#[tokio::test(start_paused = true)]
async fn bait_is_measured_at_settle_and_removed() {
    let page = ScriptedPage::new(PageScript {
        hidden_classes: strings(&["ad"]),
        latency_ms: 200,
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    let bait = detection.first_party.bait();
    assert_eq!(bait.inserted, 4);
    // "ad" appears in sets 0 and 3 only.
    assert_eq!(bait.hidden, 2);
    assert_eq!(
        detection.first_party.outcome(ProbeId::BaitElements),
        ProbeOutcome::Blocked
    );
    assert_eq!(page.live_elements(), 0);
}

#[tokio::test(start_paused = true)]
async fn elements_are_removed_when_the_deadline_fires() {
    let page = ScriptedPage::new(PageScript {
        latency_ms: 60_000,
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(800),
    )
    .await;

    assert_eq!(
        detection.first_party.outcome(ProbeId::ScriptResource),
        ProbeOutcome::Inconclusive
    );
    assert_eq!(page.live_elements(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_body_leaves_bait_inconclusive() {
    let page = ScriptedPage::new(PageScript {
        body_unavailable: true,
        blocked_urls: strings(&["/ads/ad.gif"]),
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    assert_eq!(
        detection.first_party.outcome(ProbeId::BaitElements),
        ProbeOutcome::Inconclusive
    );
    assert_eq!(
        detection.third_party.outcome(ProbeId::AdsboxBait),
        ProbeOutcome::Inconclusive
    );
    assert_eq!(
        detection.first_party.outcome(ProbeId::ImageResource),
        ProbeOutcome::Blocked
    );
}

#[tokio::test(start_paused = true)]
async fn unreadable_styles_still_remove_every_element() {
    let page = ScriptedPage::new(PageScript {
        hidden_classes: strings(&["ad-banner", "adsbox"]),
        styles_unreadable: true,
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    assert!(detection.first_party.is_settled());
    assert!(detection.third_party.is_settled());
    let bait = detection.first_party.bait();
    assert_eq!(bait.inserted, 4);
    assert_eq!(bait.hidden, 0);
    assert_ne!(
        detection.first_party.outcome(ProbeId::BaitElements),
        ProbeOutcome::Blocked
    );
    assert_eq!(
        detection.third_party.outcome(ProbeId::AdsboxBait),
        ProbeOutcome::Inconclusive
    );
    assert_eq!(page.live_elements(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_removal_does_not_stop_the_run_settling() {
    let page = ScriptedPage::new(PageScript {
        removal_fails: true,
        ..script("/", desktop_chrome())
    });
    let mut session = PageSession::new("/");
    let start = Instant::now();

    let detection = detect(
        &page,
        &ProbeTargets::default(),
        &mut session,
        Duration::from_millis(1500),
    )
    .await;

    assert!(start.elapsed() < Duration::from_millis(1500));
    assert!(detection.first_party.is_settled());
    assert!(detection.third_party.is_settled());
    for probe in ProbeId::FIRST_PARTY {
        assert_eq!(detection.first_party.outcome(*probe), ProbeOutcome::Clear);
    }
    // Four bait divs, the probe script and the adsbox div.
    assert_eq!(page.live_elements(), 6);
}

#[tokio::test(start_paused = true)]
async fn probe_urls_carry_cache_busters() {
    let page = ScriptedPage::new(script("/", desktop_chrome()));

    detect(
        &page,
        &ProbeTargets::default(),
        &mut PageSession::new("/"),
        Duration::from_millis(1500),
    )
    .await;

    let requests = page.requests();
    assert!(requests.iter().any(|r| r.starts_with("/ads/ad.gif?ts=")));
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.starts_with("/ads/test.js?ts="))
            .count(),
        2
    );
    assert!(
        requests
            .iter()
            .any(|r| r == "https://securepubads.g.doubleclick.net/gampad/ads")
    );
}

#[tokio::test(start_paused = true)]
async fn each_run_gets_a_fresh_id() {
    let mut h = harness(script("/", desktop_chrome()));

    let outcome = h.gate.on_page_load().await.unwrap();

    assert_ne!(outcome.first_party.run_id, outcome.third_party.run_id);
    assert_eq!(outcome.first_party.timeout_ms, 1500);
    assert!(outcome.third_party.bait.is_none());
}
