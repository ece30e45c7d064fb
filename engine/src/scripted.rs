//! A page host driven by a declarative script.
//!
//! [`ScriptedPage`] stands in for a browser: cosmetic rules are a list of
//! class names, network blocking is a list of URL substrings, and latency is
//! simulated with `tokio::time::sleep` so paused-clock tests stay exact.
//! Every side effect the engine performs is recorded for inspection.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use adgate_types::{
    DomError, ElementId, ElementSpec, EnvironmentSnapshot, FrameInfo, LoadError, Mount,
    TextElement, UiState, Visibility,
};
use serde::{Deserialize, Serialize};

use crate::host::{LoadFut, PageHost};

/// A URL pattern that answers slowly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowUrl {
    /// Substring matched against the requested URL.
    pub pattern: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedText {
    pub tag: String,
    pub text: String,
}

/// Declarative description of a page and the blocker running on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageScript {
    pub path: String,
    pub environment: EnvironmentSnapshot,
    /// Inserted bait carrying any of these classes computes to `display:none`.
    pub hidden_classes: Vec<String>,
    /// Loads whose URL contains any of these substrings fail.
    pub blocked_urls: Vec<String>,
    /// Latency applied to every load unless a `slow` entry matches.
    pub latency_ms: u64,
    pub slow: Vec<SlowUrl>,
    /// Names present on the global object.
    pub globals: Vec<String>,
    /// `src` of each iframe on the page.
    pub frames: Vec<String>,
    pub labels: Vec<ScriptedText>,
    /// DOM ids of elements that exist before any script runs.
    pub dom_ids: Vec<String>,
    /// The document body is missing, so nothing can be appended to it.
    pub body_unavailable: bool,
    /// Reading the computed style of an inserted element throws.
    pub styles_unreadable: bool,
    /// Removing an inserted element throws and leaves it attached.
    pub removal_fails: bool,
}

impl Default for PageScript {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            environment: EnvironmentSnapshot::default(),
            hidden_classes: Vec::new(),
            blocked_urls: Vec::new(),
            latency_ms: 0,
            slow: Vec::new(),
            globals: Vec::new(),
            frames: Vec::new(),
            labels: Vec::new(),
            dom_ids: Vec::new(),
            body_unavailable: false,
            styles_unreadable: false,
            removal_fails: false,
        }
    }
}

impl PageScript {
    fn latency_for(&self, url: &str) -> Duration {
        let ms = self
            .slow
            .iter()
            .find(|slow| url.contains(&slow.pattern))
            .map_or(self.latency_ms, |slow| slow.latency_ms);
        Duration::from_millis(ms)
    }

    fn is_blocked(&self, url: &str) -> bool {
        self.blocked_urls
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }

    fn hides(&self, class_names: &str) -> bool {
        class_names
            .split_whitespace()
            .any(|class| self.hidden_classes.iter().any(|hidden| hidden == class))
    }
}

#[derive(Debug, Default)]
struct PageState {
    next_id: u64,
    whitelisted: bool,
    inserted: BTreeMap<ElementId, ElementSpec>,
    dom_ids: Vec<String>,
    requests: Vec<String>,
    ui_states: Vec<UiState>,
    navigations: Vec<String>,
    feedback: Vec<String>,
    hidden_containers: Vec<ElementId>,
    removed_dom_ids: Vec<String>,
}

pub struct ScriptedPage {
    script: PageScript,
    frames: Vec<FrameInfo>,
    labels: Vec<TextElement>,
    state: Mutex<PageState>,
}

impl ScriptedPage {
    #[must_use]
    pub fn new(script: PageScript) -> Self {
        let mut next_id = 1;
        let mut allocate = || {
            let id = ElementId::new(next_id);
            next_id += 1;
            id
        };
        let frames = script
            .frames
            .iter()
            .map(|src| FrameInfo {
                element: allocate(),
                src: src.clone(),
            })
            .collect();
        let labels = script
            .labels
            .iter()
            .map(|label| TextElement {
                element: allocate(),
                tag: label.tag.clone(),
                text: label.text.clone(),
            })
            .collect();
        let state = PageState {
            next_id,
            dom_ids: script.dom_ids.clone(),
            ..PageState::default()
        };
        Self {
            script,
            frames,
            labels,
            state: Mutex::new(state),
        }
    }

    #[must_use]
    pub fn script(&self) -> &PageScript {
        &self.script
    }

    /// The visitor turns the blocker off for this site: cosmetic rules,
    /// URL blocking and blocker globals all stop applying.
    pub fn whitelist(&self) {
        self.with_state(|s| s.whitelisted = true);
    }

    fn is_whitelisted(&self) -> bool {
        self.with_state(|s| s.whitelisted)
    }

    fn blocks(&self, url: &str) -> bool {
        !self.is_whitelisted() && self.script.is_blocked(url)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PageState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    /// Elements the engine inserted and has not removed.
    #[must_use]
    pub fn live_elements(&self) -> usize {
        self.with_state(|s| s.inserted.len())
    }

    /// Every URL requested, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.with_state(|s| s.requests.clone())
    }

    #[must_use]
    pub fn ui_states(&self) -> Vec<UiState> {
        self.with_state(|s| s.ui_states.clone())
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.with_state(|s| s.navigations.clone())
    }

    #[must_use]
    pub fn feedback(&self) -> Vec<String> {
        self.with_state(|s| s.feedback.clone())
    }

    #[must_use]
    pub fn hidden_containers(&self) -> Vec<ElementId> {
        self.with_state(|s| s.hidden_containers.clone())
    }

    #[must_use]
    pub fn removed_dom_ids(&self) -> Vec<String> {
        self.with_state(|s| s.removed_dom_ids.clone())
    }

    fn load<'a>(&'a self, url: &'a str) -> LoadFut<'a> {
        self.with_state(|s| s.requests.push(url.to_string()));
        let latency = self.script.latency_for(url);
        let blocked = self.blocks(url);
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if blocked {
                Err(LoadError::BlockedByClient)
            } else {
                Ok(())
            }
        })
    }

    fn is_page_element(&self, id: ElementId) -> bool {
        self.frames.iter().any(|f| f.element == id) || self.labels.iter().any(|l| l.element == id)
    }
}

impl PageHost for ScriptedPage {
    fn environment(&self) -> EnvironmentSnapshot {
        self.script.environment.clone()
    }

    fn current_path(&self) -> String {
        self.script.path.clone()
    }

    fn insert_element(&self, spec: &ElementSpec) -> Result<ElementId, DomError> {
        if spec.mount() == Mount::Body && self.script.body_unavailable {
            return Err(DomError::NoBody);
        }
        Ok(self.with_state(|s| {
            let id = ElementId::new(s.next_id);
            s.next_id += 1;
            s.inserted.insert(id, spec.clone());
            id
        }))
    }

    fn inspect_visibility(&self, id: ElementId) -> Result<Visibility, DomError> {
        let spec = self
            .with_state(|s| s.inserted.get(&id).cloned())
            .ok_or(DomError::Detached(id))?;
        if self.script.styles_unreadable {
            return Err(DomError::Access(format!("getComputedStyle failed for {id}")));
        }
        Ok(match spec {
            ElementSpec::Bait { class_names, .. }
                if !self.is_whitelisted() && self.script.hides(&class_names) =>
            {
                Visibility::collapsed()
            }
            ElementSpec::Bait { .. } => Visibility::rendered(1, 1),
            ElementSpec::Script { .. } => Visibility::rendered(0, 0),
        })
    }

    fn remove_element(&self, id: ElementId) -> Result<(), DomError> {
        if self.script.removal_fails {
            return Err(DomError::Access(format!("removeChild failed for {id}")));
        }
        self.with_state(|s| s.inserted.remove(&id))
            .map(|_| ())
            .ok_or(DomError::Detached(id))
    }

    fn load_image<'a>(&'a self, url: &'a str) -> LoadFut<'a> {
        self.load(url)
    }

    fn fetch_head<'a>(&'a self, url: &'a str) -> LoadFut<'a> {
        self.load(url)
    }

    fn script_settled(&self, id: ElementId) -> LoadFut<'_> {
        let src = self.with_state(|s| match s.inserted.get(&id) {
            Some(ElementSpec::Script { src }) => Some(src.clone()),
            _ => None,
        });
        let Some(src) = src else {
            return Box::pin(async move {
                Err(LoadError::Resource(format!("no script element {id}")))
            });
        };
        self.with_state(|s| s.requests.push(src.clone()));
        let latency = self.script.latency_for(&src);
        let blocked = self.blocks(&src);
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if blocked {
                Err(LoadError::Resource(src))
            } else {
                Ok(())
            }
        })
    }

    fn has_global(&self, name: &str) -> bool {
        !self.is_whitelisted() && self.script.globals.iter().any(|g| g == name)
    }

    fn set_ui_state(&self, state: UiState) {
        self.with_state(|s| s.ui_states.push(state));
    }

    fn navigate(&self, path: &str) {
        self.with_state(|s| s.navigations.push(path.to_string()));
    }

    fn show_feedback(&self, text: &str) {
        self.with_state(|s| s.feedback.push(text.to_string()));
    }

    fn ad_frames(&self) -> Vec<FrameInfo> {
        self.frames.clone()
    }

    fn labelled_elements(&self) -> Vec<TextElement> {
        self.labels.clone()
    }

    fn hide_container(&self, id: ElementId, _selector: &str) -> Result<(), DomError> {
        if !self.is_page_element(id) {
            return Err(DomError::Detached(id));
        }
        self.with_state(|s| s.hidden_containers.push(id));
        Ok(())
    }

    fn remove_by_dom_id(&self, dom_id: &str) -> Result<bool, DomError> {
        Ok(self.with_state(|s| {
            let Some(index) = s.dom_ids.iter().position(|id| id == dom_id) else {
                return false;
            };
            let removed = s.dom_ids.remove(index);
            s.removed_dom_ids.push(removed);
            true
        }))
    }
}
