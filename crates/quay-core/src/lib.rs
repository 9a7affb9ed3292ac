//! Quay Core
//!
//! Supervises the launch of a local web backend and the native window that
//! displays it: spawn the backend (optional), poll until it accepts requests,
//! open the window once, tear everything down when the window closes.

mod backend;
mod config;
mod error;
mod probe;
mod session;
mod supervisor;

pub use backend::BackendHandle;
pub use config::{BackendCommand, LaunchConfig, RetryPolicy, WindowOptions, DEFAULT_TARGET_URL};
pub use error::ShellError;
pub use probe::{poll_until_ready, ReadinessProbe};
pub use session::{CancelFlag, LaunchSession, SessionState};
pub use supervisor::ShellSupervisor;

pub type Result<T> = std::result::Result<T, ShellError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
