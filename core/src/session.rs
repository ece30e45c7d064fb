//! Per-load session state.
//!
//! Everything that must survive between the stages of one page load lives
//! here and is passed explicitly: the derived context, the "already ran"
//! guard, the issued navigation, and the last UI state.

use std::time::Duration;

use adgate_types::{ExecutionContext, RunId, UiState, Verdict};
use thiserror::Error;

use crate::navigation::{self, Transition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("detection already started for this page load")]
    AlreadyInitialized,
    #[error("page load pipeline has not run yet")]
    NotInitialized,
    #[error("navigation to {target} already issued")]
    NavigationIssued { target: String },
}

/// A navigation the session has committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target: String,
    /// Wait before leaving the page (recheck lets feedback render first).
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct PageSession {
    path: String,
    context: Option<ExecutionContext>,
    initialized: bool,
    navigation: Option<NavigationIntent>,
    ui_state: Option<UiState>,
    ui_writes: u32,
    next_run: RunId,
}

impl PageSession {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            context: None,
            initialized: false,
            navigation: None,
            ui_state: None,
            ui_writes: 0,
            next_run: RunId::new(1),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn context(&self) -> Option<ExecutionContext> {
        self.context
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// A navigation was issued; the load is over.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.navigation.is_some()
    }

    #[must_use]
    pub fn navigation(&self) -> Option<&NavigationIntent> {
        self.navigation.as_ref()
    }

    #[must_use]
    pub fn ui_state(&self) -> Option<UiState> {
        self.ui_state
    }

    /// How many times the UI marker has been written this load.
    #[must_use]
    pub fn ui_writes(&self) -> u32 {
        self.ui_writes
    }

    /// Start the page-load pipeline. Fails on re-entry.
    pub fn begin(&mut self, context: ExecutionContext) -> Result<(), SessionError> {
        if self.initialized {
            return Err(SessionError::AlreadyInitialized);
        }
        self.initialized = true;
        self.context = Some(context);
        Ok(())
    }

    /// Context for a recheck: the one derived at load time.
    pub fn recheck_context(&self) -> Result<ExecutionContext, SessionError> {
        if let Some(intent) = &self.navigation {
            return Err(SessionError::NavigationIssued {
                target: intent.target.clone(),
            });
        }
        self.context.ok_or(SessionError::NotInitialized)
    }

    /// Hand out the next run id.
    pub fn allocate_run(&mut self) -> RunId {
        let id = self.next_run;
        self.next_run = id.next();
        id
    }

    pub fn record_ui_state(&mut self, state: UiState) {
        self.ui_state = Some(state);
        self.ui_writes += 1;
    }

    /// Apply the transition function once.
    ///
    /// Returns `Stay` whenever a navigation has already been committed, so
    /// re-entry never produces a second navigation.
    pub fn transition(&mut self, verdict: &Verdict, delay: Duration) -> Transition {
        if self.navigation.is_some() {
            return Transition::Stay;
        }
        let transition = navigation::next(&self.path, verdict);
        if let Transition::Navigate { target, .. } = &transition {
            self.navigation = Some(NavigationIntent {
                target: target.clone(),
                delay,
            });
        }
        transition
    }
}
