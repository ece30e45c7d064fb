//! Core domain types for adgate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod context;
mod dom;
mod ids;
mod probe;
mod verdict;

pub use context::{BrowserIdentity, DeviceClass, EnvironmentSnapshot, ExecutionContext};
pub use dom::{DomError, ElementSpec, FrameInfo, LoadError, Mount, TextElement, Visibility};
pub use ids::{ElementId, RunId};
pub use probe::{BaitTally, ProbeId, ProbeOutcome, ProbeResult, RunKind};
pub use verdict::{TrackingReport, UiState, Variant, Verdict};
