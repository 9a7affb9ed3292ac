//! Main window creation

use quay_core::{ShellError, ShellSupervisor};
use tauri::{AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::MAIN_WINDOW;

/// Create the main shell window pointed at the backend. The caller confirms
/// the window binding with the supervisor first, so this runs at most once
/// per session. Tauri windows carry no default menu, so nothing has to be
/// stripped here.
pub fn open_main_window(
    app: &AppHandle,
    supervisor: &ShellSupervisor,
) -> quay_core::Result<WebviewWindow> {
    let options = &supervisor.config().window;
    let url = supervisor.target_url().clone();

    let mut builder = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::External(url))
        .title(&options.title)
        .inner_size(options.width, options.height)
        .center();

    if let Some(path) = &options.icon_path {
        match tauri::image::Image::from_path(path) {
            Ok(icon) => {
                builder = builder
                    .icon(icon)
                    .map_err(|e| ShellError::WindowCreation(e.to_string()))?;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not load window icon");
            }
        }
    }

    builder
        .build()
        .map_err(|e| ShellError::WindowCreation(e.to_string()))
}

/// Recreate the main window after a resident close (macOS activate).
#[cfg(target_os = "macos")]
pub fn reopen_main_window(app: &AppHandle, supervisor: &ShellSupervisor) -> quay_core::Result<()> {
    use tauri::Manager;

    if app.get_webview_window(MAIN_WINDOW).is_some() {
        return Ok(());
    }

    if !supervisor.confirm_window_reopen() {
        return Ok(());
    }

    if let Err(e) = open_main_window(app, supervisor) {
        // Roll the binding back so the next activate can try again
        supervisor.window_closed();
        return Err(e);
    }

    Ok(())
}
