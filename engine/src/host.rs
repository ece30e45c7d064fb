//! The page host seam.
//!
//! Everything the engine does to the page goes through [`PageHost`]. A
//! browser binding implements it against the live document; tests and the
//! replay binary use [`crate::ScriptedPage`].

use std::future::Future;
use std::pin::Pin;

use adgate_types::{
    DomError, ElementId, ElementSpec, EnvironmentSnapshot, FrameInfo, LoadError, TextElement,
    UiState, Visibility,
};

/// Resource load future type alias. `Err` means the load failed.
pub type LoadFut<'a> = Pin<Box<dyn Future<Output = Result<(), LoadError>> + Send + 'a>>;

pub trait PageHost: Send + Sync {
    /// Values the classifier reads, sampled once per load.
    fn environment(&self) -> EnvironmentSnapshot;

    /// `location.pathname` of the current document.
    fn current_path(&self) -> String;

    fn insert_element(&self, spec: &ElementSpec) -> Result<ElementId, DomError>;

    /// Computed style and layout of an inserted element.
    fn inspect_visibility(&self, id: ElementId) -> Result<Visibility, DomError>;

    fn remove_element(&self, id: ElementId) -> Result<(), DomError>;

    /// Load `url` as an image.
    fn load_image<'a>(&'a self, url: &'a str) -> LoadFut<'a>;

    /// Issue a `HEAD` request for `url`.
    fn fetch_head<'a>(&'a self, url: &'a str) -> LoadFut<'a>;

    /// Resolves once an inserted script element fires `load` or `error`.
    fn script_settled(&self, id: ElementId) -> LoadFut<'_>;

    /// A property with this name exists on the global object.
    fn has_global(&self, name: &str) -> bool;

    /// Write the process-wide blocking marker and banner visibility.
    fn set_ui_state(&self, state: UiState);

    /// Full-page navigation. The document is gone once this returns.
    fn navigate(&self, path: &str);

    /// Show a line of text under the whitelist prompt.
    fn show_feedback(&self, text: &str);

    fn ad_frames(&self) -> Vec<FrameInfo>;

    fn labelled_elements(&self) -> Vec<TextElement>;

    /// Hide the closest ancestor of `id` matching `selector`.
    fn hide_container(&self, id: ElementId, selector: &str) -> Result<(), DomError>;

    /// Remove the element with this DOM id. `Ok(false)` if there was none.
    fn remove_by_dom_id(&self, dom_id: &str) -> Result<bool, DomError>;
}
