//! Mock classifier for development and testing

use crate::{
    Classifier, ClassifierMetadata, LabelSet, ModelDescriptor, PredictError, PredictionResult,
    FLOWER_INPUT_SHAPE,
};
use async_trait::async_trait;
use frame_preprocess::Tensor;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Output {
    Fixed(Vec<f32>),
    Random,
    Fail(String),
}

/// Classifier that returns canned or random scores and counts its calls.
pub struct MockClassifier {
    name: String,
    labels: LabelSet,
    output: Output,
    latency: Option<Duration>,
    predictions: AtomicUsize,
}

impl MockClassifier {
    fn with_output(output: Output) -> Self {
        Self {
            name: "Mock flower classifier".to_string(),
            labels: LabelSet::flowers(),
            output,
            latency: None,
            predictions: AtomicUsize::new(0),
        }
    }

    /// Always returns `scores`.
    pub fn fixed(scores: Vec<f32>) -> Self {
        Self::with_output(Output::Fixed(scores))
    }

    /// Returns a fresh random distribution on every call.
    pub fn random() -> Self {
        Self::with_output(Output::Random)
    }

    /// Every prediction fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_output(Output::Fail(reason.into()))
    }

    pub fn from_descriptor(desc: &ModelDescriptor) -> Self {
        let mut mock = match &desc.scores {
            Some(scores) => Self::fixed(scores.clone()),
            None => Self::random(),
        };
        mock.name = desc.name.clone();
        mock.labels = desc.labels.clone();
        mock
    }

    /// Simulated inference time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `predict` calls so far.
    pub fn prediction_count(&self) -> usize {
        self.predictions.load(Ordering::SeqCst)
    }
}

fn random_scores(n: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let logits: Vec<f32> = (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect();
    let exp: Vec<f32> = logits.iter().map(|l| l.exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn predict(&self, input: &Tensor) -> Result<PredictionResult, PredictError> {
        self.predictions.fetch_add(1, Ordering::SeqCst);
        self.metadata().check_input(input)?;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match &self.output {
            Output::Fixed(scores) => Ok(PredictionResult::new(scores.clone())),
            Output::Random => Ok(PredictionResult::new(random_scores(self.labels.len()))),
            Output::Fail(reason) => Err(PredictError::Backend(reason.clone())),
        }
    }

    fn metadata(&self) -> ClassifierMetadata {
        ClassifierMetadata {
            name: self.name.clone(),
            model_type: "mock".to_string(),
            input_shape: FLOWER_INPUT_SHAPE,
            labels: self.labels.clone(),
        }
    }
}
