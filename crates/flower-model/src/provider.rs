use crate::{Classifier, LoadError, ModelDescriptor, ModelFormat, DESCRIPTOR_FILE};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Load the classifier stored in `dir`. One attempt, no retry.
pub async fn load(dir: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, LoadError> {
    let dir = dir.as_ref();
    let path = dir.join(DESCRIPTOR_FILE);
    info!(path = %path.display(), "loading model");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let descriptor = ModelDescriptor::parse(&raw)?;
    descriptor.validate()?;

    let classifier = build(dir, descriptor).await?;
    let meta = classifier.metadata();
    info!(name = %meta.name, model_type = %meta.model_type, "model loaded");
    Ok(classifier)
}

async fn build(dir: &Path, descriptor: ModelDescriptor) -> Result<Arc<dyn Classifier>, LoadError> {
    match descriptor.format {
        ModelFormat::Mock => {
            #[cfg(feature = "mock")]
            {
                let _ = dir;
                Ok(Arc::new(crate::mock::MockClassifier::from_descriptor(&descriptor)))
            }
            #[cfg(not(feature = "mock"))]
            {
                let _ = dir;
                Err(LoadError::UnsupportedFormat("mock feature not enabled".into()))
            }
        }
        ModelFormat::Onnx => {
            #[cfg(feature = "onnx")]
            {
                let classifier = crate::onnx::OnnxClassifier::load(dir, &descriptor).await?;
                Ok(Arc::new(classifier))
            }
            #[cfg(not(feature = "onnx"))]
            {
                let _ = dir;
                Err(LoadError::UnsupportedFormat("onnx feature not enabled".into()))
            }
        }
    }
}

/// Readiness of the process-wide classifier.
#[derive(Clone)]
pub enum ModelStatus {
    Loading,
    Ready(Arc<dyn Classifier>),
    Failed(String),
}

impl fmt::Debug for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Loading => f.write_str("Loading"),
            ModelStatus::Ready(c) => write!(f, "Ready({})", c.metadata().name),
            ModelStatus::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

/// Shared cell recording the single model-load outcome.
#[derive(Clone)]
pub struct ModelSlot {
    tx: Arc<watch::Sender<ModelStatus>>,
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ModelStatus::Loading);
        Self { tx: Arc::new(tx) }
    }

    /// Load from `dir` on a background task.
    pub fn spawn_load(&self, dir: impl Into<PathBuf>) -> JoinHandle<()> {
        let dir = dir.into();
        self.spawn_with(async move { load(dir).await })
    }

    /// Resolve the slot with the outcome of `fut`, run on a background task.
    pub fn spawn_with<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Arc<dyn Classifier>, LoadError>> + Send + 'static,
    {
        let slot = self.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(classifier) => slot.set_ready(classifier),
                Err(err) => slot.set_failed(&err),
            }
        })
    }

    pub fn set_ready(&self, classifier: Arc<dyn Classifier>) {
        self.resolve(ModelStatus::Ready(classifier));
    }

    pub fn set_failed(&self, err: &LoadError) {
        error!(error = %err, "model load failed; predictions disabled");
        self.resolve(ModelStatus::Failed(err.to_string()));
    }

    fn resolve(&self, status: ModelStatus) {
        let resolved = self.tx.send_if_modified(|current| {
            if matches!(current, ModelStatus::Loading) {
                *current = status;
                true
            } else {
                false
            }
        });
        if !resolved {
            warn!("model slot already resolved; ignoring second outcome");
        }
    }

    pub fn status(&self) -> ModelStatus {
        self.tx.borrow().clone()
    }

    /// The classifier, if loading has completed successfully.
    pub fn classifier(&self) -> Option<Arc<dyn Classifier>> {
        match &*self.tx.borrow() {
            ModelStatus::Ready(c) => Some(Arc::clone(c)),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(&*self.tx.borrow(), ModelStatus::Failed(_))
    }

    /// Wait until the slot leaves `Loading`.
    pub async fn resolved(&self) -> ModelStatus {
        let mut rx = self.tx.subscribe();
        let status = match rx
            .wait_for(|s| !matches!(s, ModelStatus::Loading))
            .await
        {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        };
        status
    }
}
