//! Shared routing state between the orchestrator and the request path.
//!
//! This is the only state touched by both the orchestrator loop (writer)
//! and concurrent request handlers (readers). A single mutex covers every
//! field, so a request overlapping a swap observes either the fully-old or
//! fully-new target, never a mixture of endpoint and side label.

use crate::Side;
use std::sync::{Arc, Mutex, PoisonError};

/// The live forwarding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBackend {
    /// Side currently serving traffic.
    pub side: Side,
    /// Endpoint requests are forwarded to.
    pub endpoint: String,
}

#[derive(Debug, Default)]
struct RouterState {
    active: Option<ActiveBackend>,
    staging: Option<Side>,
    last_error: Option<String>,
}

/// Cloneable handle to the router state.
///
/// The orchestrator is the only writer; request handlers only call
/// [`RouterHandle::active`] and [`RouterHandle::status_text`].
#[derive(Debug, Clone, Default)]
pub struct RouterHandle {
    state: Arc<Mutex<RouterState>>,
}

impl RouterHandle {
    /// Creates a handle with no active target.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current forwarding target, if any backend has ever
    /// reached readiness.
    pub fn active(&self) -> Option<ActiveBackend> {
        self.lock().active.clone()
    }

    /// Last recorded cycle error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Atomically promotes `side`/`endpoint` to live and clears any
    /// recorded error and staging marker.
    pub fn swap(&self, side: Side, endpoint: String) {
        let mut state = self.lock();
        state.active = Some(ActiveBackend { side, endpoint });
        state.staging = None;
        state.last_error = None;
    }

    /// Marks `side` as being rebuilt, for status reporting.
    pub fn set_staging(&self, side: Option<Side>) {
        self.lock().staging = side;
    }

    /// Records a cycle failure for the status endpoint. The active target
    /// is left untouched.
    pub fn record_error(&self, message: String) {
        let mut state = self.lock();
        state.last_error = Some(message);
        state.staging = None;
    }

    /// Plain-text diagnostic served at `/_buildstatus`.
    pub fn status_text(&self) -> String {
        let state = self.lock();
        let staging = state
            .staging
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        let current = state
            .active
            .as_ref()
            .map_or_else(|| "none".to_string(), |a| a.side.to_string());
        let error = state.last_error.as_deref().unwrap_or("none");
        format!("side={staging}\ncurrent={current}\nerror={error}\n")
    }
}
