use crate::types::Operation;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    /// The native side reported a failure. The payload is forwarded untouched.
    #[error("Native operation failed ({operation}): {payload}")]
    Native { operation: Operation, payload: Value },

    /// The executor dropped the continuation without replying.
    #[error("Native executor abandoned {operation} without a reply")]
    Abandoned { operation: Operation },

    #[error("Failed to decode {operation} result: {message}")]
    Decode { operation: Operation, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CameraError {
    /// Operation the error belongs to, when it came from a bridge call.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CameraError::Native { operation, .. }
            | CameraError::Abandoned { operation }
            | CameraError::Decode { operation, .. } => Some(*operation),
            CameraError::Config(_) | CameraError::Runtime(_) => None,
        }
    }

    /// Native failure payload, if this is a pass-through failure.
    pub fn native_payload(&self) -> Option<&Value> {
        match self {
            CameraError::Native { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Value handed back across the command boundary: the native payload
    /// verbatim, or the error message for local errors.
    pub fn into_payload(self) -> Value {
        match self {
            CameraError::Native { payload, .. } => payload,
            other => Value::String(other.to_string()),
        }
    }
}
