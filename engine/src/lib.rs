//! Async orchestration for adgate.
//!
//! The engine owns everything that waits: the two deadline-bounded detection
//! runs, telemetry delivery, and the page-load and recheck pipelines. It
//! reaches the page only through [`PageHost`].
//!
//! ```text
//! on_page_load
//!   classify ──> detect (first-party ∥ third-party, shared deadline)
//!            ──> decide ──> telemetry (spawned)
//!            ──> UI marker ──> navigate (halt) | cosmetic filter
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::module_name_repetitions)] // Domain names are clearer with module prefix

mod detector;
mod filter;
mod gate;
mod host;
mod probes;
mod resolved;
mod scoped;
mod scripted;
mod telemetry;

use adgate_core::SessionError;
use thiserror::Error;

pub use detector::{Detection, RunSummary, detect, run_first_party, run_third_party};
pub use filter::CosmeticReport;
pub use gate::{AdGate, PageLoadOutcome, RecheckOutcome, STILL_BLOCKED_FEEDBACK};
pub use host::{LoadFut, PageHost};
pub use probes::{BAIT_CLASS_SETS, BAIT_ID_PREFIX, BAIT_STYLE, EXTENSION_GLOBALS};
pub use resolved::{
    DEFAULT_PRIMARY_TIMEOUT, DEFAULT_RECHECK_NAVIGATION_DELAY, DEFAULT_RECHECK_TIMEOUT,
    DEFAULT_TRACKING_PATH, DEFAULT_VENDOR_URLS, ProbeTargets, ResolveError, ResolvedConfig,
};
pub use scripted::{PageScript, ScriptedPage, ScriptedText, SlowUrl};
pub use telemetry::{
    DisabledTelemetry, HttpTelemetry, TelemetryError, TelemetrySink, format_timestamp, sink_for,
    tracking_report,
};

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Session(#[from] SessionError),
}
