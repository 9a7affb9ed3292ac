//! Shell supervisor
//!
//! Brings up the backend (optionally), waits for it to become reachable,
//! confirms the window binding and guarantees clean teardown. Cheap to clone;
//! clones share one session.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::backend::BackendHandle;
use crate::config::LaunchConfig;
use crate::probe::ReadinessProbe;
use crate::session::{LaunchSession, SessionState};
use crate::Result;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ShellSupervisor {
    config: LaunchConfig,
    session: Arc<Mutex<LaunchSession>>,
}

impl ShellSupervisor {
    /// Create the session and spawn the backend if one is configured.
    /// A spawn failure short-circuits startup instead of leaving readiness
    /// polling to time out against a process that never started.
    pub fn start(config: LaunchConfig) -> Result<Self> {
        let mut session = LaunchSession::new(config.target_url.clone());

        if let Some(command) = &config.backend {
            let handle = BackendHandle::spawn(command)?;
            tracing::info!(
                program = %command.program,
                pid = handle.id(),
                "spawned backend process"
            );
            session.attach_backend(handle);
        }

        Ok(Self {
            config,
            session: Arc::new(Mutex::new(session)),
        })
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn target_url(&self) -> &Url {
        &self.config.target_url
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().state()
    }

    pub fn has_backend(&self) -> bool {
        self.session.lock().has_backend()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.session.lock().is_shutting_down()
    }

    /// Poll the target URL until the backend responds, per the retry policy.
    /// Returns the number of attempts used. Cancelled by `shutdown`.
    pub async fn wait_for_backend(&self) -> Result<u32> {
        let cancel = {
            let mut session = self.session.lock();
            session.begin_polling();
            session.cancel_flag()
        };

        let probe = ReadinessProbe::new(self.config.target_url.clone(), PROBE_TIMEOUT);
        let attempts = probe.wait_until_ready(&self.config.retry, &cancel).await?;

        // Only a successful probe unlocks the window binding
        self.session.lock().mark_backend_ready();

        tracing::info!(url = %self.config.target_url, attempts, "backend is ready");
        Ok(attempts)
    }

    /// Bind the window to the session. False when a window was already bound
    /// or the session stopped accepting one, so the caller skips creation.
    pub fn confirm_window_open(&self) -> bool {
        self.session.lock().mark_window_open()
    }

    /// The window went away while the session stays resident.
    pub fn window_closed(&self) {
        self.session.lock().mark_window_closed();
    }

    pub fn confirm_window_reopen(&self) -> bool {
        self.session.lock().mark_window_reopened()
    }

    /// Idempotent teardown: cancel pending probes, terminate the backend if
    /// this session spawned one. Returns true when a backend was terminated;
    /// a second call terminates nothing.
    pub fn shutdown(&self) -> bool {
        let handle = self.session.lock().begin_shutdown();

        let terminated = match handle {
            Some(mut handle) => handle.terminate(TERMINATE_GRACE),
            None => false,
        };

        self.session.lock().mark_terminated();
        terminated
    }
}
