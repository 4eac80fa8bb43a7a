//! Tests for the camera bridge dispatch contract
//!
//! Every operation must reach the executor exactly once, with the right
//! service, action, and arguments, and the caller must see exactly the
//! reply the executor produced.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use usbcamera_bridge::testing::RecordingExecutor;
use usbcamera_bridge::{
    CameraBridge, CameraError, CameraRequest, OpenOptions, Operation, PendingCall,
};

fn recording_bridge() -> (CameraBridge<Arc<RecordingExecutor>>, Arc<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::new());
    (CameraBridge::new(executor.clone()), executor)
}

fn dispatch(bridge: &CameraBridge<Arc<RecordingExecutor>>, op: Operation) -> PendingCall {
    match op {
        Operation::Open => bridge.open(OpenOptions::empty()),
        Operation::StartPreview => bridge.start_preview(),
        Operation::StopPreview => bridge.stop_preview(),
        Operation::TakePhoto => bridge.take_photo(),
        Operation::Close => bridge.close(),
        Operation::ListCameras => bridge.list_cameras(),
    }
}

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    #[test]
    fn test_each_operation_dispatches_once() {
        for op in Operation::ALL {
            let (bridge, executor) = recording_bridge();
            let _pending = dispatch(&bridge, op);

            let calls = executor.calls();
            assert_eq!(calls.len(), 1, "{} should dispatch exactly once", op);
            assert_eq!(calls[0].service, "UsbExternalCamera");
            assert_eq!(calls[0].operation, op);
            assert_eq!(calls[0].action(), op.as_str());
        }
    }

    #[test]
    fn test_open_forwards_options_unchanged() {
        let (bridge, executor) = recording_bridge();
        let options = json!({"resolution": "720p"});
        let _pending = bridge.open(options.clone());

        let calls = executor.calls();
        assert_eq!(calls[0].action(), "open");
        assert_eq!(calls[0].args, vec![options]);
    }

    #[test]
    fn test_open_forwards_empty_record() {
        let (bridge, executor) = recording_bridge();
        let _pending = bridge.open(OpenOptions::empty());
        assert_eq!(executor.calls()[0].args, vec![json!({})]);
    }

    #[test]
    fn test_other_operations_forward_no_arguments() {
        for op in Operation::ALL.into_iter().filter(|op| *op != Operation::Open) {
            let (bridge, executor) = recording_bridge();
            let _pending = dispatch(&bridge, op);
            assert!(executor.calls()[0].args.is_empty(), "{} args", op);
        }
    }

    #[test]
    fn test_dispatch_is_not_deferred_until_await() {
        let (bridge, executor) = recording_bridge();
        let pending = bridge.take_photo();
        assert_eq!(executor.len(), 1);
        drop(pending);
        assert_eq!(executor.len(), 1);
    }

    #[test]
    fn test_custom_service_name() {
        let executor = Arc::new(RecordingExecutor::new());
        let bridge = CameraBridge::new(executor.clone()).with_service_name("UvcCamera");
        let _pending = bridge.close();
        assert_eq!(executor.calls()[0].service, "UvcCamera");
    }
}

#[cfg(test)]
mod reply_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_cameras_success_value_passes_through() {
        let (bridge, executor) = recording_bridge();
        let pending = bridge.list_cameras();

        assert!(executor.succeed(0, json!([{"id": "cam0"}])));
        assert_eq!(pending.await.unwrap(), json!([{"id": "cam0"}]));
    }

    #[tokio::test]
    async fn test_failure_payload_passes_through() {
        let (bridge, executor) = recording_bridge();
        let pending = bridge.start_preview();

        executor.fail(0, json!("Camera not opened. Call open() first."));
        match pending.await {
            Err(CameraError::Native { operation, payload }) => {
                assert_eq!(operation, Operation::StartPreview);
                assert_eq!(payload, json!("Camera not opened. Call open() first."));
            }
            other => panic!("expected native failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_reply_is_rejected() {
        let (bridge, executor) = recording_bridge();
        let pending = bridge.close();

        assert!(executor.succeed(0, json!("Camera closed")));
        assert!(!executor.fail(0, json!("late failure")));
        assert_eq!(pending.await.unwrap(), json!("Camera closed"));
    }

    #[tokio::test]
    async fn test_abandoned_call_reports_abandoned() {
        let (bridge, executor) = recording_bridge();
        let pending = bridge.take_photo();

        assert!(executor.abandon(0));
        assert!(matches!(
            pending.await,
            Err(CameraError::Abandoned {
                operation: Operation::TakePhoto
            })
        ));
    }

    #[tokio::test]
    async fn test_back_to_back_calls_are_independent() {
        let (bridge, executor) = recording_bridge();
        let preview = bridge.start_preview();
        let photo = bridge.take_photo();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].action(), "startPreview");
        assert_eq!(calls[1].action(), "takePhoto");
        assert_ne!(calls[0].id, calls[1].id);

        // Resolve out of order; each caller still gets its own reply.
        executor.succeed(1, json!("/photos/USB_CAM_1.jpg"));
        executor.fail(0, json!("Preview is already active"));

        assert_eq!(photo.await.unwrap(), json!("/photos/USB_CAM_1.jpg"));
        let err = preview.await.unwrap_err();
        assert_eq!(err.native_payload(), Some(&json!("Preview is already active")));
    }

    #[tokio::test]
    async fn test_bridge_usable_after_failure() {
        let (bridge, executor) = recording_bridge();
        let first = bridge.open(json!({}));
        executor.fail(0, json!("No USB external camera found"));
        assert!(first.await.is_err());

        let second = bridge.list_cameras();
        executor.succeed(1, json!([]));
        assert_eq!(second.await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_typed_helpers_decode() {
        let (bridge, executor) = recording_bridge();
        let cameras = bridge.list_camera_descriptors();
        let photo = bridge.take_photo_path();

        executor.succeed(
            0,
            json!([{"id": "2", "lensFacing": 2, "facingName": "EXTERNAL"}]),
        );
        executor.succeed(1, json!("/sdcard/Pictures/UsbCamera/USB_CAM_x.jpg"));

        let cameras = cameras.await.unwrap();
        assert!(cameras[0].is_external());
        assert_eq!(
            photo.await.unwrap(),
            "/sdcard/Pictures/UsbCamera/USB_CAM_x.jpg"
        );
    }
}

#[cfg(test)]
mod callback_tests {
    use super::*;

    type Log = Arc<Mutex<Vec<(&'static str, Value)>>>;

    fn send_logged(
        bridge: &CameraBridge<Arc<RecordingExecutor>>,
        request: CameraRequest,
    ) -> Log {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (ok_log, err_log) = (log.clone(), log.clone());
        bridge.send_with_callbacks(
            request,
            move |v| ok_log.lock().unwrap().push(("success", v)),
            move |e| err_log.lock().unwrap().push(("failure", e)),
        );
        log
    }

    #[test]
    fn test_success_callback_only() {
        let (bridge, executor) = recording_bridge();
        let log = send_logged(&bridge, CameraRequest::ListCameras);
        assert!(log.lock().unwrap().is_empty());

        executor.succeed(0, json!([{"id": "cam0"}]));
        executor.fail(0, json!("ignored"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![("success", json!([{"id": "cam0"}]))]
        );
    }

    #[test]
    fn test_failure_callback_only() {
        let (bridge, executor) = recording_bridge();
        let log = send_logged(
            &bridge,
            CameraRequest::Open(OpenOptions::new(json!({"resolution": "720p"}))),
        );

        assert_eq!(executor.calls()[0].args, vec![json!({"resolution": "720p"})]);
        executor.fail(0, json!({"code": "PERMISSION_DENIED"}));
        executor.succeed(0, json!("ignored"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![("failure", json!({"code": "PERMISSION_DENIED"}))]
        );
    }

    #[test]
    fn test_abandoned_callbacks_never_fire() {
        let (bridge, executor) = recording_bridge();
        let log = send_logged(&bridge, CameraRequest::Close);
        executor.abandon(0);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(executor.pending(), 0);
    }
}
