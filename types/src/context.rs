//! Execution context: the coarse device and browser class of the visitor.

use serde::{Deserialize, Serialize};

/// Raw values read from the page once per load.
///
/// Everything the classifier needs, and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    /// Logical viewport width in CSS pixels.
    pub viewport_width: u32,
    /// A brand-specific privacy API (e.g. `navigator.brave.isBrave`) exists.
    #[serde(default)]
    pub privacy_api_present: bool,
    /// `chrome.runtime.id`, when the page can see one.
    #[serde(default)]
    pub runtime_extension_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// Whether the browser ships its own ad blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserIdentity {
    /// Built-in blocking, on unless the user turned it off.
    PrivacyBrowser,
    /// Known to ship no built-in blocking.
    StandardBrowser,
    /// Unknown; treated like `StandardBrowser` by the policy.
    Other,
}

/// Device class and browser identity, derived once per page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub device_class: DeviceClass,
    pub browser_identity: BrowserIdentity,
}

impl ExecutionContext {
    #[must_use]
    pub const fn new(device_class: DeviceClass, browser_identity: BrowserIdentity) -> Self {
        Self {
            device_class,
            browser_identity,
        }
    }
}
