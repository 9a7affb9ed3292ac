//! Launch session state
//!
//! One session covers one run of the shell, from start to window-closed.
//! The session owns what the source kept as process-global mutable state:
//! the backend handle, the window binding and the shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::backend::BackendHandle;

/// Cancellation token tied to a session. Every scheduled probe checks it
/// before acting on a result, so probes cannot outlive the session.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    BackendStarting,
    PollingReadiness,
    WindowOpen,
    ShuttingDown,
    Terminated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::BackendStarting => "backend_starting",
            SessionState::PollingReadiness => "polling_readiness",
            SessionState::WindowOpen => "window_open",
            SessionState::ShuttingDown => "shutting_down",
            SessionState::Terminated => "terminated",
        }
    }
}

#[derive(Debug)]
pub struct LaunchSession {
    state: SessionState,
    target_url: Url,
    backend: Option<BackendHandle>,
    cancel: CancelFlag,
    backend_ready: bool,
    window_open: bool,
}

impl LaunchSession {
    pub fn new(target_url: Url) -> Self {
        Self {
            state: SessionState::Idle,
            target_url,
            backend: None,
            cancel: CancelFlag::new(),
            backend_ready: false,
            window_open: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_window_open(&self) -> bool {
        self.window_open
    }

    pub fn is_shutting_down(&self) -> bool {
        matches!(
            self.state,
            SessionState::ShuttingDown | SessionState::Terminated
        )
    }

    /// Record the spawned backend. Idle -> BackendStarting.
    pub fn attach_backend(&mut self, handle: BackendHandle) {
        self.backend = Some(handle);
        self.transition(SessionState::BackendStarting);
    }

    /// Enter readiness polling.
    pub fn begin_polling(&mut self) {
        if matches!(
            self.state,
            SessionState::Idle | SessionState::BackendStarting
        ) {
            self.transition(SessionState::PollingReadiness);
        }
    }

    /// Record that the target URL responded successfully. Only meaningful
    /// while polling; a window cannot bind without it.
    pub fn mark_backend_ready(&mut self) {
        if self.state == SessionState::PollingReadiness {
            self.backend_ready = true;
        }
    }

    pub fn is_backend_ready(&self) -> bool {
        self.backend_ready
    }

    /// Bind the native window to this session. Allowed only once, and only
    /// after readiness polling succeeded: the window never exists before the
    /// target URL has responded.
    pub fn mark_window_open(&mut self) -> bool {
        if self.state != SessionState::PollingReadiness || !self.backend_ready || self.window_open {
            return false;
        }

        self.window_open = true;
        self.transition(SessionState::WindowOpen);
        true
    }

    /// The window went away without ending the session (platform-resident
    /// mode). A later reopen is allowed.
    pub fn mark_window_closed(&mut self) {
        self.window_open = false;
    }

    /// Rebind a window after `mark_window_closed`. Only valid while the
    /// session is alive in WindowOpen state with no window bound.
    pub fn mark_window_reopened(&mut self) -> bool {
        if self.state == SessionState::WindowOpen && !self.window_open {
            self.window_open = true;
            return true;
        }
        false
    }

    /// Start teardown. Idempotent: the first call cancels pending probes and
    /// yields the backend handle for termination; later calls yield None.
    pub fn begin_shutdown(&mut self) -> Option<BackendHandle> {
        if self.is_shutting_down() {
            return None;
        }

        self.cancel.cancel();
        self.window_open = false;
        self.transition(SessionState::ShuttingDown);
        self.backend.take()
    }

    pub fn mark_terminated(&mut self) {
        self.transition(SessionState::Terminated);
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "session transition");
        self.state = next;
    }
}
