use crate::client::CameraBridge;
use crate::executor::CommandExecutor;
use crate::types::CameraRequest;
#[cfg(feature = "tauri")]
use crate::types::OpenOptions;
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "tauri")]
use tauri::{command, State};

/// Bridge type the plugin keeps in managed state.
pub type SharedBridge = CameraBridge<Arc<dyn CommandExecutor>>;

/// Forward one request and wait for the native reply.
///
/// Failures come back as the native payload unchanged, so the webview sees
/// exactly what the camera service reported.
pub async fn run_request(bridge: &SharedBridge, request: CameraRequest) -> Result<Value, Value> {
    let pending = bridge.send(request);
    let operation = pending.operation();

    match pending.await {
        Ok(value) => {
            log::info!("{} completed", operation);
            Ok(value)
        }
        Err(e) => {
            log::error!("{} failed: {}", operation, e);
            Err(e.into_payload())
        }
    }
}

/// Open the camera with caller-defined options
#[cfg(feature = "tauri")]
#[command]
pub async fn open(bridge: State<'_, SharedBridge>, options: Value) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::Open(OpenOptions::new(options))).await
}

/// Start the camera preview
#[cfg(feature = "tauri")]
#[command]
pub async fn start_preview(bridge: State<'_, SharedBridge>) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::StartPreview).await
}

/// Stop the camera preview
#[cfg(feature = "tauri")]
#[command]
pub async fn stop_preview(bridge: State<'_, SharedBridge>) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::StopPreview).await
}

/// Take a photo
#[cfg(feature = "tauri")]
#[command]
pub async fn take_photo(bridge: State<'_, SharedBridge>) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::TakePhoto).await
}

/// Close the camera
#[cfg(feature = "tauri")]
#[command]
pub async fn close(bridge: State<'_, SharedBridge>) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::Close).await
}

/// List cameras known to the native side
#[cfg(feature = "tauri")]
#[command]
pub async fn list_cameras(bridge: State<'_, SharedBridge>) -> Result<Value, Value> {
    run_request(&bridge, CameraRequest::ListCameras).await
}
