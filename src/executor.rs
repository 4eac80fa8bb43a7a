//! The native command executor seam.
//!
//! A [`CommandExecutor`] receives one [`NativeCall`] together with a
//! [`Continuation`], and must eventually reply through that continuation
//! exactly once. Replying consumes the continuation, so a second reply or a
//! reply on both channels cannot be written. A continuation dropped without
//! a reply resolves the caller's [`PendingCall`] with
//! [`CameraError::Abandoned`].

use crate::errors::CameraError;
use crate::types::{NativeCall, Operation};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use uuid::Uuid;

type Callback = Box<dyn FnOnce(Value) + Send + 'static>;
type Reply = Result<Value, Value>;

/// Host-side mechanism that runs a named action of a named native service.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, call: NativeCall, continuation: Continuation);
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Arc<E> {
    fn execute(&self, call: NativeCall, continuation: Continuation) {
        (**self).execute(call, continuation)
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Box<E> {
    fn execute(&self, call: NativeCall, continuation: Continuation) {
        (**self).execute(call, continuation)
    }
}

/// Adapts a closure into a [`CommandExecutor`].
pub struct FnExecutor<F>(F);

pub fn executor_fn<F>(f: F) -> FnExecutor<F>
where
    F: Fn(NativeCall, Continuation) + Send + Sync,
{
    FnExecutor(f)
}

impl<F> CommandExecutor for FnExecutor<F>
where
    F: Fn(NativeCall, Continuation) + Send + Sync,
{
    fn execute(&self, call: NativeCall, continuation: Continuation) {
        (self.0)(call, continuation)
    }
}

enum Sink {
    Channel(oneshot::Sender<Reply>),
    Callbacks {
        on_success: Callback,
        on_failure: Callback,
    },
}

/// Single-use reply handle for one native call.
pub struct Continuation {
    call_id: Uuid,
    operation: Operation,
    sink: Option<Sink>,
}

impl Continuation {
    /// Continuation paired with a future the caller can await.
    pub fn channel(call: &NativeCall) -> (Self, PendingCall) {
        let (tx, rx) = oneshot::channel();
        let continuation = Self {
            call_id: call.id,
            operation: call.operation,
            sink: Some(Sink::Channel(tx)),
        };
        let pending = PendingCall {
            call_id: call.id,
            operation: call.operation,
            rx,
        };
        (continuation, pending)
    }

    /// Continuation that runs one of two closures on reply.
    pub fn from_callbacks<S, F>(call: &NativeCall, on_success: S, on_failure: F) -> Self
    where
        S: FnOnce(Value) + Send + 'static,
        F: FnOnce(Value) + Send + 'static,
    {
        Self {
            call_id: call.id,
            operation: call.operation,
            sink: Some(Sink::Callbacks {
                on_success: Box::new(on_success),
                on_failure: Box::new(on_failure),
            }),
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn success(mut self, value: Value) {
        self.deliver(Ok(value));
    }

    pub fn failure(mut self, payload: Value) {
        self.deliver(Err(payload));
    }

    pub fn resolve(mut self, reply: Result<Value, Value>) {
        self.deliver(reply);
    }

    fn deliver(&mut self, reply: Reply) {
        match self.sink.take() {
            Some(Sink::Channel(tx)) => {
                if tx.send(reply).is_err() {
                    log::debug!(
                        "Caller stopped waiting for {} ({}); reply discarded",
                        self.operation,
                        self.call_id
                    );
                }
            }
            Some(Sink::Callbacks {
                on_success,
                on_failure,
            }) => match reply {
                Ok(value) => on_success(value),
                Err(payload) => on_failure(payload),
            },
            None => {}
        }
    }
}

impl Drop for Continuation {
    fn drop(&mut self) {
        if self.sink.is_some() {
            log::warn!(
                "Continuation for {} ({}) dropped without a reply",
                self.operation,
                self.call_id
            );
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match self.sink {
            Some(Sink::Channel(_)) => "channel",
            Some(Sink::Callbacks { .. }) => "callbacks",
            None => "delivered",
        };
        f.debug_struct("Continuation")
            .field("call_id", &self.call_id)
            .field("operation", &self.operation)
            .field("sink", &sink)
            .finish()
    }
}

/// Outcome of a dispatched call.
///
/// The native call was already handed to the executor when this value was
/// created; awaiting only waits for the reply. Dropping it does not cancel
/// the native call.
#[derive(Debug)]
#[must_use = "the native call is already dispatched; await the reply or drop it explicitly"]
pub struct PendingCall {
    call_id: Uuid,
    operation: Operation,
    rx: oneshot::Receiver<Reply>,
}

impl PendingCall {
    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Future for PendingCall {
    type Output = Result<Value, CameraError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(CameraError::Native { operation, payload }),
            Err(_) => Err(CameraError::Abandoned { operation }),
        })
    }
}
