use anyhow::{bail, Context};
use camera_source::{FacingMode, ReacquirePolicy};
use clap::ValueEnum;
use inference_loop::LoopConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    #[default]
    Mock,
    ImageDir,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub kind: CameraKind,
    /// Root holding `front/` and `rear/` image folders (image-dir only).
    pub dir: Option<PathBuf>,
    pub mock_width: u32,
    pub mock_height: u32,
    pub reacquire: ReacquirePolicy,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            kind: CameraKind::Mock,
            dir: None,
            mock_width: 640,
            mock_height: 480,
            reacquire: ReacquirePolicy::ReleaseFirst,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    pub facing: FacingMode,
    pub camera: CameraConfig,
    pub inference: LoopConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("flowers_model"),
            facing: FacingMode::Front,
            camera: CameraConfig::default(),
            inference: LoopConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.camera.kind == CameraKind::ImageDir && self.camera.dir.is_none() {
            bail!("camera kind image-dir requires `camera.dir` (or --camera-dir)");
        }
        if self.camera.kind == CameraKind::Mock
            && (self.camera.mock_width == 0 || self.camera.mock_height == 0)
        {
            bail!("mock camera resolution must be non-zero");
        }
        Ok(())
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let cfg: AppConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_loop::NotReadyPolicy;

    #[test]
    fn empty_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.yaml");
        fs::write(&path, "{}\n").unwrap();
        let cfg = load_config_file(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn nested_sections_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.yaml");
        fs::write(
            &path,
            "model_dir: models/flowers\n\
             facing: rear\n\
             camera:\n  kind: image-dir\n  dir: samples\n  reacquire: restore-previous\n\
             inference:\n  not_ready: poll\n  inference_timeout_ms: 250\n",
        )
        .unwrap();
        let cfg = load_config_file(&path).unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from("models/flowers"));
        assert_eq!(cfg.facing, FacingMode::Rear);
        assert_eq!(cfg.camera.kind, CameraKind::ImageDir);
        assert_eq!(cfg.camera.reacquire, ReacquirePolicy::RestorePrevious);
        assert_eq!(cfg.inference.not_ready, NotReadyPolicy::Poll);
        assert_eq!(cfg.inference.frame_interval_ms, 16);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn image_dir_without_dir_is_invalid() {
        let cfg = AppConfig {
            camera: CameraConfig {
                kind: CameraKind::ImageDir,
                ..CameraConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config_file("does/not/exist.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.yaml"));
    }
}
