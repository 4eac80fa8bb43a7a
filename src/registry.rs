//! In-process host for native services.
//!
//! [`PluginRegistry`] plays the role of the host plugin manager: it owns a
//! table of named [`NativeService`]s and routes each [`NativeCall`] to the
//! service named in it. Services run on tokio's blocking pool, so every
//! reply reaches the caller asynchronously, and a slow camera action never
//! stalls the caller's thread.

use crate::errors::CameraError;
use crate::executor::{CommandExecutor, Continuation};
use crate::types::NativeCall;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;

/// A native plugin reachable through the registry.
pub trait NativeService: Send + Sync {
    /// Run `action`. The service now owns `continuation` and must reply
    /// through it exactly once, possibly later from another thread.
    ///
    /// Returns the continuation untouched when the action is not supported.
    fn execute(
        &self,
        action: &str,
        args: Vec<Value>,
        continuation: Continuation,
    ) -> Result<(), Continuation>;
}

pub struct PluginRegistry {
    services: RwLock<HashMap<String, Arc<dyn NativeService>>>,
    handle: Handle,
}

impl PluginRegistry {
    /// Registry bound to the current tokio runtime.
    pub fn new() -> Result<Self, CameraError> {
        let handle = Handle::try_current().map_err(|e| {
            CameraError::Runtime(format!("Plugin registry needs a tokio runtime: {}", e))
        })?;
        Ok(Self::with_handle(handle))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            handle,
        }
    }

    /// Register `service` under `name`, returning any service it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        service: Arc<dyn NativeService>,
    ) -> Option<Arc<dyn NativeService>> {
        let name = name.into();
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        let previous = services.insert(name.clone(), service);
        if previous.is_some() {
            log::info!("Replaced native service {}", name);
        } else {
            log::info!("Registered native service {}", name);
        }
        previous
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn NativeService>> {
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn NativeService>> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl CommandExecutor for PluginRegistry {
    fn execute(&self, call: NativeCall, continuation: Continuation) {
        let service = self.lookup(&call.service);

        self.handle.spawn_blocking(move || {
            let Some(service) = service else {
                log::warn!("No native service named {} ({})", call.service, call.id);
                continuation.failure(Value::String(format!(
                    "Service not found: {}",
                    call.service
                )));
                return;
            };

            let action = call.action();
            if let Err(continuation) = service.execute(action, call.args, continuation) {
                log::warn!("{} does not support action {}", call.service, action);
                continuation.failure(Value::String(format!("Invalid action: {}", action)));
            }
        });
    }
}
