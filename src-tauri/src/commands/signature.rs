use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::ui_types::UiSnapshot;
use crate::services::acquisition::{self, IMAGE_EXTENSIONS};
use crate::services::classifier::client::ClassifierClient;
use crate::services::session::{SessionEvent, SignatureSession};
use tauri::ipc::{InvokeBody, Request};
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::DialogExt;

pub const STATE_EVENT: &str = "signature-state";

fn publish(app: &AppHandle, snapshot: &UiSnapshot) {
    if let Err(e) = app.emit(STATE_EVENT, snapshot) {
        log::warn!("Failed to emit {}: {}", STATE_EVENT, e);
    }
}

#[tauri::command]
pub fn get_state(session: State<'_, SignatureSession>) -> UiSnapshot {
    session.snapshot()
}

#[tauri::command]
pub fn get_config(config: State<'_, AppConfig>) -> AppConfig {
    config.inner().clone()
}

#[tauri::command]
pub async fn pick_from_gallery(
    app: AppHandle,
    session: State<'_, SignatureSession>,
    config: State<'_, AppConfig>,
) -> Result<UiSnapshot, AppError> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .file()
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file(move |file| {
            let _ = tx.send(file);
        });

    let outcome = match rx.await {
        // Cancelled: leave everything as it was
        Ok(None) => return Ok(session.snapshot()),
        Ok(Some(file)) => {
            let max_dim = config.preview_max_dim;
            tokio::task::spawn_blocking(move || acquisition::acquire_picked(file, max_dim))
                .await
                .unwrap_or_else(|e| Err(format!("Task join failed: {}", e).into()))
        }
        Err(_) => Err(AppError::from("Media picker closed unexpectedly".to_string())),
    };

    let snapshot = session.record_acquisition("gallery", outcome);
    publish(&app, &snapshot);
    Ok(snapshot)
}

/// Receives a still frame grabbed from the camera preview as the raw request
/// body. An empty body means the user dismissed the camera.
#[tauri::command]
pub async fn capture_from_camera(
    app: AppHandle,
    session: State<'_, SignatureSession>,
    config: State<'_, AppConfig>,
    request: Request<'_>,
) -> Result<UiSnapshot, AppError> {
    let Some(frame) = frame_from_body(request.body()) else {
        return Ok(session.snapshot());
    };

    let max_dim = config.preview_max_dim;
    let outcome = tokio::task::spawn_blocking(move || acquisition::acquire_from_bytes(&frame, max_dim))
        .await
        .unwrap_or_else(|e| Err(format!("Task join failed: {}", e).into()));

    let snapshot = session.record_acquisition("camera", outcome);
    publish(&app, &snapshot);
    Ok(snapshot)
}

fn frame_from_body(body: &InvokeBody) -> Option<Vec<u8>> {
    match body {
        InvokeBody::Raw(bytes) if !bytes.is_empty() => Some(bytes.clone()),
        _ => None,
    }
}

#[tauri::command]
pub fn clear_signature(app: AppHandle, session: State<'_, SignatureSession>) -> UiSnapshot {
    session.apply(SessionEvent::Cleared);
    let snapshot = session.snapshot();
    publish(&app, &snapshot);
    snapshot
}

/// Run one classification attempt and return the resulting state.
///
/// If the image is replaced or cleared meanwhile, the attempt is aborted and
/// the state at that point is returned.
#[tauri::command]
pub async fn classify_signature(
    app: AppHandle,
    session: State<'_, SignatureSession>,
    client: State<'_, ClassifierClient>,
) -> Result<UiSnapshot, AppError> {
    let emitter = app.clone();
    let handle = session.spawn_attempt(client.inner().clone(), move |snapshot| {
        publish(&emitter, &snapshot)
    })?;

    if let Err(e) = handle.await {
        if !e.is_cancelled() {
            return Err(format!("Classification task failed: {}", e).into());
        }
        log::info!("Classification attempt was cancelled");
    }

    Ok(session.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_body_is_the_frame() {
        let body = InvokeBody::Raw(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(frame_from_body(&body), Some(vec![0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn empty_or_json_body_is_a_dismissal() {
        assert_eq!(frame_from_body(&InvokeBody::Raw(Vec::new())), None);
        assert_eq!(frame_from_body(&InvokeBody::Json(serde_json::Value::Null)), None);
    }
}
