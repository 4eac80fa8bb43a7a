//! usbcamera-bridge: typed client bridge to the `UsbExternalCamera` native plugin
//!
//! The crate forwards six camera operations (`open`, `startPreview`,
//! `stopPreview`, `takePhoto`, `close`, `listCameras`) to a native command
//! executor and hands the reply back as a `Result`. The bridge itself keeps
//! no camera state; all of that lives on the native side.
//!
//! # Features
//! - [`CameraBridge`]: one method per operation, dispatching immediately
//! - [`CommandExecutor`]: the injectable seam to the host platform
//! - [`PluginRegistry`]: an in-process host for native services
//! - A Tauri plugin exposing the operations as commands
//! - Test doubles in [`testing`], including a simulated camera service
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use usbcamera_bridge::{CameraBridge, OpenOptions};
//!
//! let bridge = CameraBridge::new(Arc::new(my_executor));
//! let ack = bridge.open(OpenOptions::empty().with_width(1280)).await?;
//! let path = bridge.take_photo_path().await?;
//! ```
//!
//! In a Tauri app:
//! ```rust,ignore
//! tauri::Builder::default()
//!     .plugin(usbcamera_bridge::init(executor))
//!     .run(tauri::generate_context!())
//!     .expect("error while running tauri application");
//! ```
pub mod client;
pub mod commands;
pub mod config;
pub mod errors;
pub mod executor;
pub mod registry;
pub mod types;

// Testing utilities - executors and a simulated camera for offline testing
pub mod testing;

// Re-exports for convenience
pub use client::CameraBridge;
pub use commands::camera::SharedBridge;
pub use config::{BridgeConfig, BridgeSettings};
pub use errors::CameraError;
pub use executor::{executor_fn, CommandExecutor, Continuation, PendingCall};
pub use registry::{NativeService, PluginRegistry};
pub use types::{
    CameraDescriptor, CameraRequest, LensFacing, NativeCall, OpenOptions, Operation,
    DEFAULT_SERVICE_NAME,
};

#[cfg(feature = "tauri")]
use std::sync::Arc;
#[cfg(feature = "tauri")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Name the plugin registers under; commands are `plugin:usb-external-camera|<command>`.
pub const PLUGIN_NAME: &str = "usb-external-camera";

/// Initialize the plugin with the default service name
#[cfg(feature = "tauri")]
pub fn init<R: Runtime>(executor: Arc<dyn CommandExecutor>) -> TauriPlugin<R> {
    init_with_settings(executor, BridgeSettings::default())
}

/// Initialize the plugin with explicit bridge settings
#[cfg(feature = "tauri")]
pub fn init_with_settings<R: Runtime>(
    executor: Arc<dyn CommandExecutor>,
    settings: BridgeSettings,
) -> TauriPlugin<R> {
    let bridge: SharedBridge = CameraBridge::from_settings(executor, &settings);

    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            commands::camera::open,
            commands::camera::start_preview,
            commands::camera::stop_preview,
            commands::camera::take_photo,
            commands::camera::close,
            commands::camera::list_cameras,
        ])
        .setup(move |app, _api| {
            log::info!(
                "{} plugin forwarding to native service {}",
                PLUGIN_NAME,
                bridge.service_name()
            );
            app.manage(bridge);
            Ok(())
        })
        .build()
}

/// Initialize logging for the bridge
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "usbcamera_bridge=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        service_name: DEFAULT_SERVICE_NAME.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub service_name: String,
}
