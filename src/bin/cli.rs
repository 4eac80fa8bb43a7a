use anyhow::{bail, Context};
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use usbcamera_bridge::testing::simulated_bridge;
use usbcamera_bridge::{init_logging, BridgeConfig, CameraBridge, CommandExecutor, OpenOptions};

const USAGE: &str = "Usage: usbcam-cli [--config <path>] <list-cameras|open|take-photo|session> \
[--width N] [--height N] [--fps N] [--camera-id ID] [--json]";

struct Options {
    config: Option<PathBuf>,
    command: String,
    open: OpenOptions,
    json: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut config = None;
    let mut command = None;
    let mut open = OpenOptions::empty();
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(value_at(args, i)?));
            }
            "--width" => {
                i += 1;
                open = open.with_width(value_at(args, i)?.parse()?);
            }
            "--height" => {
                i += 1;
                open = open.with_height(value_at(args, i)?.parse()?);
            }
            "--fps" => {
                i += 1;
                open = open.with_fps(value_at(args, i)?.parse()?);
            }
            "--camera-id" => {
                i += 1;
                open = open.with_camera_id(value_at(args, i)?);
            }
            "--json" => json = true,
            other if command.is_none() => command = Some(other.to_string()),
            other => bail!("Unexpected argument: {}\n{}", other, USAGE),
        }
        i += 1;
    }

    let Some(command) = command else {
        bail!("{}", USAGE);
    };
    Ok(Options {
        config,
        command,
        open,
        json,
    })
}

fn value_at(args: &[String], i: usize) -> anyhow::Result<&str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("Missing value for {}", args[i - 1]))
}

fn print(label: &str, value: &Value, json: bool) {
    if json {
        println!("{}", value);
    } else {
        match value {
            Value::String(s) => println!("{}: {}", label, s),
            other => println!("{}: {:#}", label, other),
        }
    }
}

async fn cmd_list_cameras<E: CommandExecutor>(
    bridge: &CameraBridge<E>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        print("cameras", &bridge.list_cameras().await?, true);
        return Ok(());
    }
    for camera in bridge.list_camera_descriptors().await? {
        println!("{}: {}", camera.id, camera.facing_name);
    }
    Ok(())
}

async fn cmd_open<E: CommandExecutor>(
    bridge: &CameraBridge<E>,
    options: OpenOptions,
    json: bool,
) -> anyhow::Result<()> {
    print("open", &bridge.open(options).await?, json);
    print("close", &bridge.close().await?, json);
    Ok(())
}

async fn cmd_take_photo<E: CommandExecutor>(
    bridge: &CameraBridge<E>,
    options: OpenOptions,
    json: bool,
) -> anyhow::Result<()> {
    bridge.open(options).await?;
    let path = bridge.take_photo_path().await;
    bridge.close().await?;
    print("photo", &Value::String(path?), json);
    Ok(())
}

async fn cmd_session<E: CommandExecutor>(
    bridge: &CameraBridge<E>,
    options: OpenOptions,
    json: bool,
) -> anyhow::Result<()> {
    print("open", &bridge.open(options).await?, json);
    print("startPreview", &bridge.start_preview().await?, json);
    print("takePhoto", &bridge.take_photo().await?, json);
    print("stopPreview", &bridge.stop_preview().await?, json);
    print("close", &bridge.close().await?, json);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args)?;

    let (config, source) = match &options.config {
        Some(path) => (BridgeConfig::load_from_file(path)?, path.clone()),
        None => (BridgeConfig::load_or_default(), BridgeConfig::default_path()),
    };
    if let Err(msg) = config.validate() {
        bail!("Invalid configuration in {:?}: {}", source, msg);
    }

    let (bridge, _camera) = simulated_bridge(&config)?;

    match options.command.as_str() {
        "list-cameras" => cmd_list_cameras(&bridge, options.json).await,
        "open" => cmd_open(&bridge, options.open, options.json).await,
        "take-photo" => cmd_take_photo(&bridge, options.open, options.json).await,
        "session" => cmd_session(&bridge, options.open, options.json).await,
        other => bail!("Unknown command: {}\n{}", other, USAGE),
    }
}
