//! Configuration management for the camera bridge
//!
//! Provides loading, saving, and validation of the bridge settings and of
//! the simulated native camera used by the CLI and tests.

use crate::errors::CameraError;
use crate::types::{LensFacing, DEFAULT_SERVICE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bridge: BridgeSettings,
    pub simulator: SimulatorConfig,
}

/// Settings for the client side of the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Name the native camera service is registered under
    pub service_name: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

/// Simulated native camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Directory photos are written to
    pub photo_directory: String,
    /// Cameras reported by `listCameras`
    pub cameras: Vec<SimulatedCameraConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedCameraConfig {
    pub id: String,
    /// Native lens-facing code (0 front, 1 back, 2 external)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_facing: Option<i32>,
}

impl SimulatedCameraConfig {
    pub fn new(id: impl Into<String>, facing: Option<LensFacing>) -> Self {
        Self {
            id: id.into(),
            lens_facing: facing.map(|f| f.code()),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            photo_directory: "./captures".to_string(),
            cameras: vec![
                SimulatedCameraConfig::new("0", Some(LensFacing::Back)),
                SimulatedCameraConfig::new("1", Some(LensFacing::Front)),
                SimulatedCameraConfig::new("2", Some(LensFacing::External)),
            ],
        }
    }
}

impl BridgeConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::Config(format!("Failed to read config file: {}", e)))?;

        let config: BridgeConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("usbcamera.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.bridge.service_name.trim().is_empty() {
            return Err("Service name must not be empty".to_string());
        }

        if self.simulator.photo_directory.trim().is_empty() {
            return Err("Photo directory must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for camera in &self.simulator.cameras {
            if camera.id.is_empty() {
                return Err("Camera id must not be empty".to_string());
            }
            if !seen.insert(camera.id.as_str()) {
                return Err(format!("Duplicate camera id: {}", camera.id));
            }
        }

        Ok(())
    }
}
