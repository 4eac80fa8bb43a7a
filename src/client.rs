//! Client façade over the native camera service.

use crate::config::BridgeSettings;
use crate::errors::CameraError;
use crate::executor::{CommandExecutor, Continuation, PendingCall};
use crate::types::{
    CameraDescriptor, CameraRequest, NativeCall, OpenOptions, Operation, DEFAULT_SERVICE_NAME,
};
use serde_json::Value;
use std::future::Future;

/// Forwards camera operations to a [`CommandExecutor`].
///
/// The bridge holds no camera state. Every method hands exactly one call to
/// the executor before returning, and the returned [`PendingCall`] resolves
/// with whatever the native side replied. Overlapping calls are neither
/// ordered nor serialized here.
#[derive(Debug, Clone)]
pub struct CameraBridge<E> {
    executor: E,
    service: String,
}

impl<E: CommandExecutor> CameraBridge<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            service: DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    pub fn from_settings(executor: E, settings: &BridgeSettings) -> Self {
        Self::new(executor).with_service_name(settings.service_name.clone())
    }

    /// Target a native service registered under another name.
    pub fn with_service_name(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn open(&self, options: impl Into<OpenOptions>) -> PendingCall {
        self.send(CameraRequest::Open(options.into()))
    }

    pub fn start_preview(&self) -> PendingCall {
        self.send(CameraRequest::StartPreview)
    }

    pub fn stop_preview(&self) -> PendingCall {
        self.send(CameraRequest::StopPreview)
    }

    pub fn take_photo(&self) -> PendingCall {
        self.send(CameraRequest::TakePhoto)
    }

    pub fn close(&self) -> PendingCall {
        self.send(CameraRequest::Close)
    }

    pub fn list_cameras(&self) -> PendingCall {
        self.send(CameraRequest::ListCameras)
    }

    /// Dispatch a request and return a future for its reply.
    pub fn send(&self, request: CameraRequest) -> PendingCall {
        let call = self.native_call(request);
        let (continuation, pending) = Continuation::channel(&call);
        self.dispatch(call, continuation);
        pending
    }

    /// Dispatch a request with a success and a failure callback. Exactly one
    /// of them runs, once, when the native side replies.
    pub fn send_with_callbacks<S, F>(&self, request: CameraRequest, on_success: S, on_failure: F)
    where
        S: FnOnce(Value) + Send + 'static,
        F: FnOnce(Value) + Send + 'static,
    {
        let call = self.native_call(request);
        let continuation = Continuation::from_callbacks(&call, on_success, on_failure);
        self.dispatch(call, continuation);
    }

    /// `listCameras` decoded into descriptors. Dispatches immediately.
    pub fn list_camera_descriptors(
        &self,
    ) -> impl Future<Output = Result<Vec<CameraDescriptor>, CameraError>> + Send + 'static {
        let pending = self.list_cameras();
        async move {
            let value = pending.await?;
            serde_json::from_value(value).map_err(|e| CameraError::Decode {
                operation: Operation::ListCameras,
                message: e.to_string(),
            })
        }
    }

    /// `takePhoto` decoded as the saved file path. Dispatches immediately.
    pub fn take_photo_path(
        &self,
    ) -> impl Future<Output = Result<String, CameraError>> + Send + 'static {
        let pending = self.take_photo();
        async move {
            match pending.await? {
                Value::String(path) => Ok(path),
                other => Err(CameraError::Decode {
                    operation: Operation::TakePhoto,
                    message: format!("expected a file path, got {}", other),
                }),
            }
        }
    }

    fn native_call(&self, request: CameraRequest) -> NativeCall {
        let operation = request.operation();
        NativeCall::new(self.service.clone(), operation, request.into_args())
    }

    fn dispatch(&self, call: NativeCall, continuation: Continuation) {
        log::debug!(
            "Dispatching {}.{} ({}) with {} argument(s)",
            call.service,
            call.action(),
            call.id,
            call.args.len()
        );
        self.executor.execute(call, continuation);
    }
}
