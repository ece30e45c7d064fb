//! Values exchanged with the page host: element specs, computed visibility,
//! and the two failure kinds a host can report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ElementId;

/// Where an inserted element is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mount {
    Head,
    Body,
}

/// Element the engine asks the host to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementSpec {
    /// A `div` with the given id, class list and inline style, appended to the body.
    Bait {
        dom_id: String,
        class_names: String,
        style: String,
    },
    /// A `script` element with `src`, appended to the head.
    Script { src: String },
}

impl ElementSpec {
    #[must_use]
    pub fn mount(&self) -> Mount {
        match self {
            Self::Bait { .. } => Mount::Body,
            Self::Script { .. } => Mount::Head,
        }
    }
}

/// Computed style and layout of an element, as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Visibility {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub has_offset_parent: bool,
    pub offset_width: u32,
    pub offset_height: u32,
}

impl Visibility {
    /// Laid out and painted, with a non-empty box.
    #[must_use]
    pub const fn rendered(width: u32, height: u32) -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            has_offset_parent: true,
            offset_width: width,
            offset_height: height,
        }
    }

    /// What a cosmetic `display:none` rule produces.
    #[must_use]
    pub const fn collapsed() -> Self {
        Self {
            display_none: true,
            visibility_hidden: false,
            has_offset_parent: false,
            offset_width: 0,
            offset_height: 0,
        }
    }

    /// Hidden by computed style, detached from layout, or zero-sized.
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        self.display_none
            || self.visibility_hidden
            || !self.has_offset_parent
            || self.offset_width == 0
            || self.offset_height == 0
    }
}

/// An iframe as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub element: ElementId,
    pub src: String,
}

/// A text-bearing element (`p`, `span`, `div`, ...) as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub element: ElementId,
    pub tag: String,
    pub text: String,
}

/// The host could not read or mutate the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("element {0} is not attached")]
    Detached(ElementId),
    #[error("document body is unavailable")]
    NoBody,
    #[error("DOM access failed: {0}")]
    Access(String),
}

/// A resource load or request did not succeed.
///
/// Probes treat every variant the same way: as evidence of blocking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("request blocked by client")]
    BlockedByClient,
    #[error("resource failed to load: {0}")]
    Resource(String),
}
