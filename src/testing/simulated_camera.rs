//! Simulated `UsbExternalCamera` native service
//!
//! Mirrors the observable behaviour of the Android plugin the bridge talks
//! to: the same action names, the same default capture size, the same
//! reply strings, and the same camera selection rules. Photos are synthetic
//! JPEG files written to a configurable directory, so tests and the CLI can
//! drive a full open/preview/capture/close cycle without hardware.

use crate::config::SimulatorConfig;
use crate::executor::Continuation;
use crate::registry::NativeService;
use crate::types::{CameraDescriptor, LensFacing, Operation};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_FPS: u32 = 30;

/// Capture settings applied by the last `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    open_camera: Option<String>,
    preview_active: bool,
    settings: CaptureSettings,
    faults: HashMap<String, String>,
    history: Vec<String>,
}

pub struct SimulatedUsbCamera {
    cameras: Vec<CameraDescriptor>,
    photo_directory: PathBuf,
    state: Mutex<SimState>,
}

impl SimulatedUsbCamera {
    pub fn new(cameras: Vec<CameraDescriptor>, photo_directory: impl Into<PathBuf>) -> Self {
        Self {
            cameras,
            photo_directory: photo_directory.into(),
            state: Mutex::new(SimState::default()),
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        let cameras = config
            .cameras
            .iter()
            .map(|c| CameraDescriptor::new(c.id.clone(), c.lens_facing.map(LensFacing::from_code)))
            .collect();
        Self::new(cameras, &config.photo_directory)
    }

    /// Make the next call of `action` fail with `message`.
    pub fn fail_next(&self, action: Operation, message: impl Into<String>) {
        self.state()
            .faults
            .insert(action.as_str().to_string(), message.into());
    }

    pub fn is_open(&self) -> bool {
        self.state().open_camera.is_some()
    }

    pub fn open_camera_id(&self) -> Option<String> {
        self.state().open_camera.clone()
    }

    pub fn is_preview_active(&self) -> bool {
        self.state().preview_active
    }

    pub fn settings(&self) -> CaptureSettings {
        self.state().settings
    }

    /// Actions received so far, in arrival order.
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Leaves the preview flag alone; only stopPreview and close clear it.
    fn open(&self, state: &mut SimState, args: &[Value]) -> Result<Value, String> {
        let mut requested = None;
        if let Some(options) = args.first().and_then(Value::as_object) {
            let read =
                |key: &str, default: u32| options.get(key).and_then(read_int).unwrap_or(default);
            state.settings = CaptureSettings {
                width: read("width", DEFAULT_WIDTH),
                height: read("height", DEFAULT_HEIGHT),
                fps: read("fps", DEFAULT_FPS),
            };
            requested = options
                .get("cameraId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }

        let selected = match requested {
            Some(id) => self
                .cameras
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.id.clone())
                .ok_or_else(|| format!("Failed to open camera: Camera {} not found", id))?,
            None => self
                .cameras
                .iter()
                .find(|c| c.is_external())
                .map(|c| c.id.clone())
                .ok_or_else(|| {
                    let ids: Vec<&str> = self.cameras.iter().map(|c| c.id.as_str()).collect();
                    format!(
                        "Failed to open camera: No USB external camera found. Available cameras: [{}]. \
                         Use listCameras() to see all available cameras and specify cameraId in options.",
                        ids.join(", ")
                    )
                })?,
        };

        log::debug!(
            "Simulated camera {} opened at {}x{}@{}",
            selected,
            state.settings.width,
            state.settings.height,
            state.settings.fps
        );
        state.open_camera = Some(selected);
        Ok(Value::from("Camera opened successfully"))
    }

    fn start_preview(&self, state: &mut SimState) -> Result<Value, String> {
        if state.open_camera.is_none() {
            return Err("Camera not opened. Call open() first.".to_string());
        }
        if state.preview_active {
            return Err("Preview is already active".to_string());
        }
        state.preview_active = true;
        Ok(Value::from("Preview started"))
    }

    fn take_photo(&self, state: &SimState) -> Result<Value, String> {
        if state.open_camera.is_none() {
            return Err("Camera not opened".to_string());
        }
        let path = self
            .save_photo()
            .map_err(|e| format!("Failed to save photo: {}", e))?;
        Ok(Value::from(path.to_string_lossy().into_owned()))
    }

    fn save_photo(&self) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.photo_directory)?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut path = self.photo_directory.join(format!("USB_CAM_{}.jpg", stamp));
        let mut n = 1;
        while path.exists() {
            path = self
                .photo_directory
                .join(format!("USB_CAM_{}_{}.jpg", stamp, n));
            n += 1;
        }

        // SOI, an empty APP0 segment, EOI.
        fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x02, 0xFF, 0xD9])?;
        fs::canonicalize(&path)
    }

    fn list_cameras(&self) -> Result<Value, String> {
        serde_json::to_value(&self.cameras).map_err(|e| format!("Error listing cameras: {}", e))
    }
}

/// Integer option read the way the native JSON layer does: numbers are
/// truncated, numeric strings are parsed, anything else is absent.
fn read_int(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let truncated = number.trunc();
    if truncated.is_finite() && (0.0..=u32::MAX as f64).contains(&truncated) {
        Some(truncated as u32)
    } else {
        None
    }
}

impl NativeService for SimulatedUsbCamera {
    fn execute(
        &self,
        action: &str,
        args: Vec<Value>,
        continuation: Continuation,
    ) -> Result<(), Continuation> {
        let Ok(operation) = action.parse::<Operation>() else {
            return Err(continuation);
        };

        let reply = {
            let mut state = self.state();
            state.history.push(action.to_string());

            if let Some(message) = state.faults.remove(action) {
                Err(message)
            } else {
                match operation {
                    Operation::Open => self.open(&mut state, &args),
                    Operation::StartPreview => self.start_preview(&mut state),
                    Operation::StopPreview => {
                        state.preview_active = false;
                        Ok(Value::from("Preview stopped"))
                    }
                    Operation::TakePhoto => self.take_photo(&state),
                    Operation::Close => {
                        state.open_camera = None;
                        state.preview_active = false;
                        Ok(Value::from("Camera closed"))
                    }
                    Operation::ListCameras => self.list_cameras(),
                }
            }
        };

        if let Err(message) = &reply {
            log::warn!("Simulated {} failed: {}", action, message);
        }
        continuation.resolve(reply.map_err(Value::String));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NativeCall;
    use serde_json::json;
    use std::path::Path;
    use std::sync::mpsc;

    fn run(camera: &SimulatedUsbCamera, op: Operation, args: Vec<Value>) -> Result<Value, Value> {
        let call = NativeCall::new("UsbExternalCamera", op, args.clone());
        let (tx, rx) = mpsc::channel();
        let ok_tx = tx.clone();
        let continuation = Continuation::from_callbacks(
            &call,
            move |v| ok_tx.send(Ok(v)).unwrap(),
            move |e| tx.send(Err(e)).unwrap(),
        );
        camera
            .execute(op.as_str(), args, continuation)
            .expect("known action");
        rx.recv().unwrap()
    }

    fn camera(dir: &Path) -> SimulatedUsbCamera {
        SimulatedUsbCamera::from_config(&SimulatorConfig {
            photo_directory: dir.to_string_lossy().into_owned(),
            ..SimulatorConfig::default()
        })
    }

    #[test]
    fn test_open_selects_external_camera_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        let reply = run(&cam, Operation::Open, vec![json!({})]);
        assert_eq!(reply, Ok(json!("Camera opened successfully")));
        assert_eq!(cam.open_camera_id().as_deref(), Some("2"));
        assert_eq!(cam.settings(), CaptureSettings::default());
    }

    #[test]
    fn test_open_reads_known_options() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        let options = json!({"width": 640, "height": 480, "fps": 15, "cameraId": "1"});
        assert!(run(&cam, Operation::Open, vec![options]).is_ok());
        assert_eq!(cam.open_camera_id().as_deref(), Some("1"));
        assert_eq!(
            cam.settings(),
            CaptureSettings {
                width: 640,
                height: 480,
                fps: 15
            }
        );
    }

    #[test]
    fn test_open_accepts_numeric_strings_and_floats() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        let options = json!({"width": "640", "height": 480.0, "fps": "15.9"});
        assert!(run(&cam, Operation::Open, vec![options]).is_ok());
        assert_eq!(
            cam.settings(),
            CaptureSettings {
                width: 640,
                height: 480,
                fps: 15
            }
        );

        let options = json!({"width": "wide", "height": -1, "fps": true});
        assert!(run(&cam, Operation::Open, vec![options]).is_ok());
        assert_eq!(cam.settings(), CaptureSettings::default());
    }

    #[test]
    fn test_read_int() {
        assert_eq!(read_int(&json!(" 30 ")), Some(30));
        assert_eq!(read_int(&json!(29.99)), Some(29));
        assert_eq!(read_int(&json!(1e12)), None);
        assert_eq!(read_int(&json!(null)), None);
    }

    #[test]
    fn test_open_without_external_camera_fails() {
        let cam = SimulatedUsbCamera::new(
            vec![
                CameraDescriptor::new("0", Some(LensFacing::Back)),
                CameraDescriptor::new("1", Some(LensFacing::Front)),
            ],
            std::env::temp_dir(),
        );
        let reply = run(&cam, Operation::Open, vec![json!({})]);
        assert_eq!(
            reply,
            Err(json!(
                "Failed to open camera: No USB external camera found. Available cameras: [0, 1]. \
                 Use listCameras() to see all available cameras and specify cameraId in options."
            ))
        );
        assert!(!cam.is_open());
    }

    #[test]
    fn test_open_unknown_camera_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());
        assert_eq!(
            run(&cam, Operation::Open, vec![json!({"cameraId": "9"})]),
            Err(json!("Failed to open camera: Camera 9 not found"))
        );
    }

    #[test]
    fn test_preview_requires_open_and_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        assert_eq!(
            run(&cam, Operation::StartPreview, vec![]),
            Err(json!("Camera not opened. Call open() first."))
        );
        run(&cam, Operation::Open, vec![json!({})]).unwrap();
        assert_eq!(
            run(&cam, Operation::StartPreview, vec![]),
            Ok(json!("Preview started"))
        );
        assert_eq!(
            run(&cam, Operation::StartPreview, vec![]),
            Err(json!("Preview is already active"))
        );
        assert_eq!(
            run(&cam, Operation::StopPreview, vec![]),
            Ok(json!("Preview stopped"))
        );
        assert!(!cam.is_preview_active());
    }

    #[test]
    fn test_reopen_keeps_preview_active() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        run(&cam, Operation::Open, vec![json!({})]).unwrap();
        run(&cam, Operation::StartPreview, vec![]).unwrap();
        run(&cam, Operation::Open, vec![json!({"fps": 15})]).unwrap();

        assert!(cam.is_preview_active());
        assert_eq!(
            run(&cam, Operation::StartPreview, vec![]),
            Err(json!("Preview is already active"))
        );

        run(&cam, Operation::StopPreview, vec![]).unwrap();
        assert_eq!(
            run(&cam, Operation::StartPreview, vec![]),
            Ok(json!("Preview started"))
        );
    }

    #[test]
    fn test_take_photo_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());

        assert_eq!(
            run(&cam, Operation::TakePhoto, vec![]),
            Err(json!("Camera not opened"))
        );
        run(&cam, Operation::Open, vec![json!({})]).unwrap();

        let first = run(&cam, Operation::TakePhoto, vec![]).unwrap();
        let second = run(&cam, Operation::TakePhoto, vec![]).unwrap();
        assert_ne!(first, second);

        let path = PathBuf::from(first.as_str().unwrap());
        assert!(path.is_absolute());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("USB_CAM_") && name.ends_with(".jpg"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_close_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());
        run(&cam, Operation::Open, vec![json!({})]).unwrap();
        run(&cam, Operation::StartPreview, vec![]).unwrap();

        assert_eq!(run(&cam, Operation::Close, vec![]), Ok(json!("Camera closed")));
        assert!(!cam.is_open());
        assert!(!cam.is_preview_active());
    }

    #[test]
    fn test_list_cameras_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());
        assert_eq!(
            run(&cam, Operation::ListCameras, vec![]).unwrap(),
            json!([
                {"id": "0", "lensFacing": 1, "facingName": "BACK"},
                {"id": "1", "lensFacing": 0, "facingName": "FRONT"},
                {"id": "2", "lensFacing": 2, "facingName": "EXTERNAL"},
            ])
        );
    }

    #[test]
    fn test_fault_injection_applies_once() {
        let dir = tempfile::tempdir().unwrap();
        let cam = camera(dir.path());
        cam.fail_next(Operation::ListCameras, "USB device detached");

        assert_eq!(
            run(&cam, Operation::ListCameras, vec![]),
            Err(json!("USB device detached"))
        );
        assert!(run(&cam, Operation::ListCameras, vec![]).is_ok());
        assert_eq!(cam.history(), vec!["listCameras", "listCameras"]);
    }

    #[test]
    fn test_unknown_action_returns_continuation() {
        let cam = SimulatedUsbCamera::new(Vec::new(), std::env::temp_dir());
        let call = NativeCall::new("UsbExternalCamera", Operation::Close, vec![]);
        let (continuation, _pending) = Continuation::channel(&call);
        let returned = cam.execute("zoom", vec![], continuation).unwrap_err();
        assert_eq!(returned.call_id(), call.id);
        returned.success(Value::Null);
        assert!(cam.history().is_empty());
    }
}
