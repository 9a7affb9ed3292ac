//! Backend process lifecycle
//!
//! The backend runs as a separate OS process with no IPC channel; the only
//! interaction is spawn and signal-based termination. Its stdout/stderr are
//! forwarded line-by-line into the shell's log so backend output stays
//! diagnosable.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::BackendCommand;
use crate::error::ShellError;
use crate::Result;

#[derive(Debug)]
pub struct BackendHandle {
    child: Option<Child>,
    program: String,
}

impl BackendHandle {
    /// Spawn the backend process. A spawn failure is reported immediately
    /// rather than being discovered later through readiness probes timing out.
    pub fn spawn(command: &BackendCommand) -> Result<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        // Windows-specific: hide console window
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        let mut child = cmd.spawn().map_err(ShellError::BackendSpawn)?;

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            std::thread::spawn(move || {
                for line in reader.lines().map_while(|line| line.ok()) {
                    if !line.is_empty() {
                        tracing::info!(target: "quay::backend", "{}", line);
                    }
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let reader = BufReader::new(stderr);
            std::thread::spawn(move || {
                for line in reader.lines().map_while(|line| line.ok()) {
                    if !line.is_empty() {
                        tracing::warn!(target: "quay::backend", "{}", line);
                    }
                }
            });
        }

        Ok(Self {
            child: Some(child),
            program: command.program.clone(),
        })
    }

    /// Process ID, if the process has not been terminated yet.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.id())
    }

    /// Whether the process is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Terminate the backend with an interrupt signal, waiting up to `grace`
    /// for it to exit before force-killing. Consumes the child handle, so a
    /// second call is a no-op and returns false: the process receives exactly
    /// one termination.
    pub fn terminate(&mut self, grace: Duration) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };

        let pid = child.id();
        tracing::info!(pid, program = %self.program, "terminating backend process");
        send_interrupt(pid);

        let start = Instant::now();
        while start.elapsed() < grace {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!(pid, %status, "backend process exited");
                    return true;
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(100)),
                Err(e) => {
                    tracing::warn!(pid, error = %e, "failed to poll backend process");
                    break;
                }
            }
        }

        tracing::warn!(pid, "backend did not exit within grace period, force killing");
        let _ = child.kill();
        let _ = child.wait();
        true
    }
}

impl Drop for BackendHandle {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Send a Ctrl+C-equivalent interrupt to the process.
#[cfg(not(target_os = "windows"))]
fn send_interrupt(pid: u32) {
    let _ = Command::new("kill").args(["-2", &pid.to_string()]).output();
}

#[cfg(target_os = "windows")]
fn send_interrupt(pid: u32) {
    // Graceful tree kill first (no /F flag); terminate() escalates if needed
    let _ = Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T"])
        .output();
}
