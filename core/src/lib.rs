//! Core domain logic for adgate.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! logging: classification, the detection-run ledger, the decision policy,
//! path mapping and the per-load session. The async engine drives it.

pub mod classifier;
pub mod cosmetic;
pub mod navigation;
pub mod policy;
mod run;
mod session;

pub use classifier::classify;
pub use navigation::Transition;
pub use policy::{FirstPartySignals, PolicyRule, decide};
pub use run::DetectionRun;
pub use session::{NavigationIntent, PageSession, SessionError};
