//! ONNX backend built on tract

use crate::{
    Classifier, ClassifierMetadata, LabelSet, LoadError, ModelDescriptor, PredictError,
    PredictionResult, FLOWER_INPUT_SHAPE,
};
use async_trait::async_trait;
use frame_preprocess::Tensor;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct OnnxClassifier {
    name: String,
    labels: LabelSet,
    plan: Arc<Plan>,
}

impl OnnxClassifier {
    /// Parse and optimize the weight file named by the descriptor.
    pub async fn load(dir: &Path, desc: &ModelDescriptor) -> Result<Self, LoadError> {
        let weights = desc
            .weights
            .as_deref()
            .ok_or_else(|| LoadError::Parse("onnx model without `weights` file".to_string()))?;
        let path = dir.join(weights);
        if !path.is_file() {
            return Err(LoadError::Io {
                path: path.display().to_string(),
                reason: "weights file not found".to_string(),
            });
        }
        let shape = FLOWER_INPUT_SHAPE.batched();
        let plan = tokio::task::spawn_blocking(move || -> TractResult<Plan> {
            tract_onnx::onnx()
                .model_for_path(&path)?
                .with_input_fact(0, f32::fact(shape).into())?
                .into_optimized()?
                .into_runnable()
        })
        .await
        .map_err(|e| LoadError::Backend(e.to_string()))?
        .map_err(|e| LoadError::Backend(e.to_string()))?;

        Ok(Self {
            name: desc.name.clone(),
            labels: desc.labels.clone(),
            plan: Arc::new(plan),
        })
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn predict(&self, input: &Tensor) -> Result<PredictionResult, PredictError> {
        self.metadata().check_input(input)?;
        let [n, h, w, c] = input.shape();
        let array = tract_ndarray::Array4::from_shape_vec((n, h, w, c), input.as_slice().to_vec())
            .map_err(|e| PredictError::Backend(e.to_string()))?;
        let plan = Arc::clone(&self.plan);

        let scores = tokio::task::spawn_blocking(move || -> TractResult<Vec<f32>> {
            let outputs = plan.run(tvec!(array.into_tensor().into_tvalue()))?;
            let view = outputs[0].to_array_view::<f32>()?;
            Ok(view.iter().copied().collect())
        })
        .await
        .map_err(|e| PredictError::Backend(e.to_string()))?
        .map_err(|e| PredictError::Backend(e.to_string()))?;

        if scores.len() != self.labels.len() {
            return Err(PredictError::Backend(format!(
                "model produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }
        Ok(PredictionResult::new(scores))
    }

    fn metadata(&self) -> ClassifierMetadata {
        ClassifierMetadata {
            name: self.name.clone(),
            model_type: "onnx".to_string(),
            input_shape: FLOWER_INPUT_SHAPE,
            labels: self.labels.clone(),
        }
    }
}
