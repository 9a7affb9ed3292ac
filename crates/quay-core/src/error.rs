//! Supervisor error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to spawn backend process: {0}")]
    BackendSpawn(#[source] std::io::Error),

    #[error("Backend not ready after {attempts} readiness probes")]
    BackendNeverReady { attempts: u32 },

    #[error("Readiness polling cancelled")]
    Cancelled,

    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
