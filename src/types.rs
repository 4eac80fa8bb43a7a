//! Core types shared by the bridge, executors, and the command surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Service name the native camera plugin registers under.
pub const DEFAULT_SERVICE_NAME: &str = "UsbExternalCamera";

/// One of the six camera actions the bridge forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Open,
    StartPreview,
    StopPreview,
    TakePhoto,
    Close,
    ListCameras,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Open,
        Operation::StartPreview,
        Operation::StopPreview,
        Operation::TakePhoto,
        Operation::Close,
        Operation::ListCameras,
    ];

    /// Action name as the native side expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::StartPreview => "startPreview",
            Operation::StopPreview => "stopPreview",
            Operation::TakePhoto => "takePhoto",
            Operation::Close => "close",
            Operation::ListCameras => "listCameras",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown camera operation: {0}")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseOperationError(s.to_string()))
    }
}

/// Options for `open`, forwarded to the native side without inspection.
///
/// The setters only insert the keys the native camera plugin reads
/// (`width`, `height`, `fps`, `cameraId`); any other record is just as valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenOptions(Value);

impl OpenOptions {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn with_width(self, width: u32) -> Self {
        self.with_key("width", Value::from(width))
    }

    pub fn with_height(self, height: u32) -> Self {
        self.with_key("height", Value::from(height))
    }

    pub fn with_fps(self, fps: u32) -> Self {
        self.with_key("fps", Value::from(fps))
    }

    pub fn with_camera_id(self, camera_id: impl Into<String>) -> Self {
        self.with_key("cameraId", Value::String(camera_id.into()))
    }

    fn with_key(mut self, key: &str, value: Value) -> Self {
        match self.0.as_object_mut() {
            Some(map) => {
                map.insert(key.to_string(), value);
            }
            None => log::warn!("Ignoring option {} on non-object open options", key),
        }
        self
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for OpenOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// An operation together with its arguments.
///
/// Only `Open` carries a payload, so a request always has the argument
/// count its operation expects.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraRequest {
    Open(OpenOptions),
    StartPreview,
    StopPreview,
    TakePhoto,
    Close,
    ListCameras,
}

impl CameraRequest {
    pub fn operation(&self) -> Operation {
        match self {
            CameraRequest::Open(_) => Operation::Open,
            CameraRequest::StartPreview => Operation::StartPreview,
            CameraRequest::StopPreview => Operation::StopPreview,
            CameraRequest::TakePhoto => Operation::TakePhoto,
            CameraRequest::Close => Operation::Close,
            CameraRequest::ListCameras => Operation::ListCameras,
        }
    }

    /// Argument list forwarded to the native side.
    pub fn into_args(self) -> Vec<Value> {
        match self {
            CameraRequest::Open(options) => vec![options.into_value()],
            _ => Vec::new(),
        }
    }

    /// Build a request for an argument-free operation. `Open` needs options
    /// and yields `None`.
    pub fn without_args(operation: Operation) -> Option<Self> {
        match operation {
            Operation::Open => None,
            Operation::StartPreview => Some(CameraRequest::StartPreview),
            Operation::StopPreview => Some(CameraRequest::StopPreview),
            Operation::TakePhoto => Some(CameraRequest::TakePhoto),
            Operation::Close => Some(CameraRequest::Close),
            Operation::ListCameras => Some(CameraRequest::ListCameras),
        }
    }
}

/// A single request handed to a [`crate::CommandExecutor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeCall {
    pub id: Uuid,
    pub service: String,
    pub operation: Operation,
    pub args: Vec<Value>,
    pub issued_at: DateTime<Utc>,
}

impl NativeCall {
    pub fn new(service: impl Into<String>, operation: Operation, args: Vec<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
            operation,
            args,
            issued_at: Utc::now(),
        }
    }

    pub fn action(&self) -> &'static str {
        self.operation.as_str()
    }
}

/// Lens direction as reported by the native camera list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensFacing {
    Front,
    Back,
    External,
    Other(i32),
}

impl LensFacing {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LensFacing::Front,
            1 => LensFacing::Back,
            2 => LensFacing::External,
            other => LensFacing::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            LensFacing::Front => 0,
            LensFacing::Back => 1,
            LensFacing::External => 2,
            LensFacing::Other(code) => *code,
        }
    }

    /// Native display name; `UNKNOWN` when no facing was reported.
    pub fn name(facing: Option<LensFacing>) -> String {
        match facing {
            None => "UNKNOWN".to_string(),
            Some(LensFacing::Front) => "FRONT".to_string(),
            Some(LensFacing::Back) => "BACK".to_string(),
            Some(LensFacing::External) => "EXTERNAL".to_string(),
            Some(LensFacing::Other(code)) => format!("OTHER({})", code),
        }
    }
}

/// Typed view of one `listCameras` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDescriptor {
    pub id: String,
    #[serde(default)]
    pub lens_facing: Option<i32>,
    #[serde(default)]
    pub facing_name: String,
}

impl CameraDescriptor {
    pub fn new(id: impl Into<String>, facing: Option<LensFacing>) -> Self {
        Self {
            id: id.into(),
            lens_facing: facing.map(|f| f.code()),
            facing_name: LensFacing::name(facing),
        }
    }

    pub fn facing(&self) -> Option<LensFacing> {
        self.lens_facing.map(LensFacing::from_code)
    }

    pub fn is_external(&self) -> bool {
        self.facing() == Some(LensFacing::External)
    }
}
