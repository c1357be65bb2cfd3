//! flower-cam: live flower classification from a camera
//!
//! Frames flow camera → 244x244 tensor → classifier → status line. Press
//! `c` + Enter to switch between front and rear cameras, `q` to quit.

mod config;

use anyhow::{Context, Result};
use camera_source::{CameraBackend, CameraSource, FacingMode, MockCamera, ReacquirePolicy};
use clap::{Parser, ValueEnum};
use config::{load_config_file, AppConfig, CameraKind};
use flower_model::ModelSlot;
use inference_loop::{ConsoleSink, InferenceLoop, LoopHandle, NotReadyPolicy, ResultSink};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "flower-cam",
    version,
    about = "Classify flowers from a live camera feed"
)]
struct Cli {
    /// YAML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model directory containing model.json
    #[arg(long)]
    model_dir: Option<PathBuf>,
    /// Camera to start with
    #[arg(long, value_enum)]
    facing: Option<Facing>,
    /// Camera backend
    #[arg(long, value_enum)]
    camera: Option<CameraKind>,
    /// Root of front/ and rear/ image folders for the image-dir backend
    #[arg(long)]
    camera_dir: Option<PathBuf>,
    /// What to do while the model is still loading
    #[arg(long, value_enum)]
    not_ready: Option<NotReady>,
    /// Delay between predictions in milliseconds
    #[arg(long)]
    frame_interval_ms: Option<u64>,
    /// Inference timeout in milliseconds (0 disables it)
    #[arg(long)]
    inference_timeout_ms: Option<u64>,
    /// Behaviour when switching cameras fails
    #[arg(long, value_enum)]
    reacquire: Option<Reacquire>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Facing {
    Front,
    Rear,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum NotReady {
    Stall,
    Poll,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Reacquire {
    ReleaseFirst,
    RestorePrevious,
}

impl From<Facing> for FacingMode {
    fn from(f: Facing) -> Self {
        match f {
            Facing::Front => FacingMode::Front,
            Facing::Rear => FacingMode::Rear,
        }
    }
}

impl From<NotReady> for NotReadyPolicy {
    fn from(p: NotReady) -> Self {
        match p {
            NotReady::Stall => NotReadyPolicy::Stall,
            NotReady::Poll => NotReadyPolicy::Poll,
        }
    }
}

impl From<Reacquire> for ReacquirePolicy {
    fn from(p: Reacquire) -> Self {
        match p {
            Reacquire::ReleaseFirst => ReacquirePolicy::ReleaseFirst,
            Reacquire::RestorePrevious => ReacquirePolicy::RestorePrevious,
        }
    }
}

impl Cli {
    fn resolve(&self) -> Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(dir) = &self.model_dir {
            cfg.model_dir = dir.clone();
        }
        if let Some(facing) = self.facing {
            cfg.facing = facing.into();
        }
        if let Some(kind) = self.camera {
            cfg.camera.kind = kind;
        }
        if let Some(dir) = &self.camera_dir {
            cfg.camera.dir = Some(dir.clone());
        }
        if let Some(policy) = self.not_ready {
            cfg.inference.not_ready = policy.into();
        }
        if let Some(ms) = self.frame_interval_ms {
            cfg.inference.frame_interval_ms = ms;
        }
        if let Some(ms) = self.inference_timeout_ms {
            cfg.inference.inference_timeout_ms = Some(ms);
        }
        if let Some(policy) = self.reacquire {
            cfg.camera.reacquire = policy.into();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let cfg = cli.resolve()?;

    info!("flower-cam starting");
    info!("Model directory: {}", cfg.model_dir.display());
    info!("Camera: {:?} ({})", cfg.camera.kind, cfg.facing);

    // Model load and camera acquisition run concurrently.
    let model = ModelSlot::new();
    let load_task = model.spawn_load(cfg.model_dir.clone());

    let backend = build_backend(&cfg)?;
    let mut camera = CameraSource::new(backend, cfg.facing).with_policy(cfg.camera.reacquire);
    let mut sink = ConsoleSink::stdout();
    if let Err(e) = camera.start().await {
        error!("Error accessing the camera: {}", e);
        sink.alert("Error accessing the camera, please check device settings.");
    }

    let (inference, handle) = InferenceLoop::new(camera, model, sink, cfg.inference.clone());
    let loop_task = tokio::spawn(inference.run());

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("ctrl-c handler failed: {}", e);
            }
        }
        res = read_keys(handle.clone()) => res?,
    }

    let _ = handle.teardown().await;
    let stats = loop_task.await.context("inference loop panicked")?;
    load_task.abort();
    println!();
    info!(
        "flower-cam stopped: {} published, {} skipped (model not ready), {} failed, {} timed out, {} skipped (inference busy)",
        stats.published, stats.skipped_not_ready, stats.failed, stats.timeouts, stats.skipped_busy
    );
    Ok(())
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn build_backend(cfg: &AppConfig) -> Result<Box<dyn CameraBackend>> {
    match cfg.camera.kind {
        CameraKind::Mock => Ok(Box::new(MockCamera::new(
            cfg.camera.mock_width,
            cfg.camera.mock_height,
        ))),
        CameraKind::ImageDir => {
            #[cfg(feature = "image-dir")]
            {
                let dir = cfg
                    .camera
                    .dir
                    .clone()
                    .context("image-dir camera needs a directory")?;
                Ok(Box::new(camera_source::ImageDirCamera::new(dir)))
            }
            #[cfg(not(feature = "image-dir"))]
            {
                anyhow::bail!("image-dir feature not enabled")
            }
        }
    }
}

/// Keyboard stand-in for the "change camera" button.
async fn read_keys(handle: LoopHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "c" => handle.toggle_camera().await?,
            "f" => handle.configure_camera(FacingMode::Front).await?,
            "r" => handle.configure_camera(FacingMode::Rear).await?,
            "q" => return Ok(()),
            "" => {}
            other => warn!("unknown key {:?}; use c (switch camera) or q (quit)", other),
        }
    }
    // stdin closed: keep running until ctrl-c
    std::future::pending::<()>().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "flower-cam",
            "--facing",
            "rear",
            "--not-ready",
            "poll",
            "--inference-timeout-ms",
            "0",
            "--reacquire",
            "restore-previous",
        ]);
        let cfg = cli.resolve().unwrap();
        assert_eq!(cfg.facing, FacingMode::Rear);
        assert_eq!(cfg.inference.not_ready, NotReadyPolicy::Poll);
        assert_eq!(cfg.inference.inference_timeout(), None);
        assert_eq!(cfg.camera.reacquire, ReacquirePolicy::RestorePrevious);
        assert_eq!(cfg.model_dir, PathBuf::from("flowers_model"));
    }

    #[test]
    fn cli_values_map_onto_library_enums() {
        assert_eq!(FacingMode::from(Facing::Front), FacingMode::Front);
        assert_eq!(NotReadyPolicy::from(NotReady::Stall), NotReadyPolicy::Stall);
        assert_eq!(
            ReacquirePolicy::from(Reacquire::ReleaseFirst),
            ReacquirePolicy::ReleaseFirst
        );
    }

    #[test]
    fn image_dir_flag_requires_directory() {
        let cli = Cli::parse_from(["flower-cam", "--camera", "image-dir"]);
        assert!(cli.resolve().is_err());
        let cli = Cli::parse_from(["flower-cam", "--camera", "image-dir", "--camera-dir", "x"]);
        assert!(cli.resolve().is_ok());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
