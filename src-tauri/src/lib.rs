//! Quay - Tauri Application
//!
//! Thin shell around `quay-core`: spawn the backend (when configured), poll
//! it until it accepts requests, then show it in the main window. Closing
//! that window tears the backend down and exits.

mod window;

use quay_core::{LaunchConfig, ShellError, ShellSupervisor};
use tauri::{Manager, RunEvent, WindowEvent};

/// Label of the single shell window.
pub const MAIN_WINDOW: &str = "main";

/// Shutdown waits out the backend's termination grace period, so keep it off
/// the async runtime when called from the readiness task.
async fn teardown_off_runtime(supervisor: &ShellSupervisor) {
    let supervisor = supervisor.clone();
    let _ = tauri::async_runtime::spawn_blocking(move || supervisor.shutdown()).await;
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    quay_core::init_logging();

    let config = LaunchConfig::default();

    let app = tauri::Builder::default()
        .setup(move |app| {
            // A backend spawn failure aborts startup here, visibly, instead
            // of leaving readiness polling to spin forever.
            let supervisor = ShellSupervisor::start(config)?;
            app.manage(supervisor.clone());

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                match supervisor.wait_for_backend().await {
                    Ok(attempts) => {
                        if !supervisor.confirm_window_open() {
                            tracing::debug!("session no longer accepts a window, skipping open");
                            return;
                        }
                        match window::open_main_window(&handle, &supervisor) {
                            Ok(_) => tracing::info!(attempts, "shell window open"),
                            Err(e) => {
                                // Window creation failure is fatal
                                tracing::error!(error = %e, "failed to create main window");
                                teardown_off_runtime(&supervisor).await;
                                handle.exit(1);
                            }
                        }
                    }
                    Err(ShellError::Cancelled) => {
                        tracing::debug!("readiness polling cancelled before the window opened");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "backend never became ready");
                        teardown_off_runtime(&supervisor).await;
                        handle.exit(1);
                    }
                }
            });

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building quay shell");

    app.run(|app, event| match event {
        RunEvent::WindowEvent {
            label,
            event: WindowEvent::Destroyed,
            ..
        } if label == MAIN_WINDOW => {
            let supervisor = app.state::<ShellSupervisor>();
            if supervisor.has_backend() || !cfg!(target_os = "macos") {
                let terminated = supervisor.shutdown();
                tracing::info!(terminated_backend = terminated, "main window closed, exiting");
                app.exit(0);
            } else {
                // macOS convention: stay resident until an explicit quit;
                // the window can come back on activate.
                supervisor.window_closed();
            }
        }
        RunEvent::ExitRequested { api, code, .. } => {
            let supervisor = app.state::<ShellSupervisor>();
            if cfg!(target_os = "macos") && code.is_none() && !supervisor.is_shutting_down() {
                api.prevent_exit();
            }
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows,
            ..
        } => {
            if !has_visible_windows {
                let supervisor = app.state::<ShellSupervisor>();
                if let Err(e) = window::reopen_main_window(app, &supervisor) {
                    tracing::warn!(error = %e, "failed to reopen main window");
                }
            }
        }
        RunEvent::Exit => {
            // Covers quit paths that skip the window-close handler; shutdown
            // is idempotent so the usual path terminates nothing twice.
            app.state::<ShellSupervisor>().shutdown();
        }
        _ => {}
    });
}
