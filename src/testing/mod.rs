//! Testing utilities for the camera bridge
//!
//! Provides executors and a simulated native camera service so the bridge
//! can be exercised offline, without a host platform or hardware.

pub mod recording;
pub mod simulated_camera;

pub use recording::RecordingExecutor;
pub use simulated_camera::{CaptureSettings, SimulatedUsbCamera};

use crate::client::CameraBridge;
use crate::config::BridgeConfig;
use crate::errors::CameraError;
use crate::registry::PluginRegistry;
use std::sync::Arc;

/// Registry with a [`SimulatedUsbCamera`] registered under the configured
/// service name, and a bridge pointed at it.
pub fn simulated_bridge(
    config: &BridgeConfig,
) -> Result<(CameraBridge<Arc<PluginRegistry>>, Arc<SimulatedUsbCamera>), CameraError> {
    let registry = Arc::new(PluginRegistry::new()?);
    let camera = Arc::new(SimulatedUsbCamera::from_config(&config.simulator));
    registry.register(config.bridge.service_name.clone(), camera.clone());
    let bridge = CameraBridge::from_settings(registry, &config.bridge);
    Ok((bridge, camera))
}
