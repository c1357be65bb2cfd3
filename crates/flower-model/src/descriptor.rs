use crate::{LabelSet, LoadError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the descriptor inside a model directory.
pub const DESCRIPTOR_FILE: &str = "model.json";

/// Spatial input size the classifier was trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct InputShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

pub const FLOWER_INPUT_SHAPE: InputShape = InputShape {
    height: 244,
    width: 244,
    channels: 3,
};

impl From<[usize; 3]> for InputShape {
    fn from([height, width, channels]: [usize; 3]) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

impl From<InputShape> for [usize; 3] {
    fn from(s: InputShape) -> Self {
        [s.height, s.width, s.channels]
    }
}

impl InputShape {
    /// Batched NHWC shape with a batch of one.
    pub fn batched(self) -> [usize; 4] {
        [1, self.height, self.width, self.channels]
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.height, self.width, self.channels)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Mock,
    Onnx,
}

/// Topology/metadata descriptor of a model directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(default = "default_name")]
    pub name: String,
    pub format: ModelFormat,
    /// Weight file, relative to the model directory.
    #[serde(default)]
    pub weights: Option<String>,
    #[serde(default = "default_input_shape")]
    pub input_shape: InputShape,
    #[serde(default)]
    pub labels: LabelSet,
    /// Fixed output for the mock backend.
    #[serde(default)]
    pub scores: Option<Vec<f32>>,
}

fn default_name() -> String {
    "flowers".to_string()
}

fn default_input_shape() -> InputShape {
    FLOWER_INPUT_SHAPE
}

impl ModelDescriptor {
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        serde_json::from_str(raw).map_err(|e| LoadError::Parse(e.to_string()))
    }

    /// The descriptor must describe the fixed flower classifier.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.input_shape != FLOWER_INPUT_SHAPE {
            return Err(LoadError::ShapeMismatch(format!(
                "input shape {} but the pipeline produces {}",
                self.input_shape, FLOWER_INPUT_SHAPE
            )));
        }
        let flowers = LabelSet::flowers();
        if self.labels != flowers {
            return Err(LoadError::ShapeMismatch(format!(
                "expected labels {:?}, got {:?}",
                flowers.iter().collect::<Vec<_>>(),
                self.labels.iter().collect::<Vec<_>>()
            )));
        }
        if let Some(scores) = &self.scores {
            if scores.len() != self.labels.len() {
                return Err(LoadError::ShapeMismatch(format!(
                    "{} fixed scores for {} labels",
                    scores.len(),
                    self.labels.len()
                )));
            }
        }
        if self.format == ModelFormat::Onnx && self.weights.is_none() {
            return Err(LoadError::Parse("onnx model without `weights` file".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_descriptor_uses_flower_defaults() {
        let d = ModelDescriptor::parse(r#"{"format":"mock"}"#).unwrap();
        assert_eq!(d.input_shape, FLOWER_INPUT_SHAPE);
        assert_eq!(d.labels, LabelSet::flowers());
        assert!(d.validate().is_ok());
    }

    #[test]
    fn wrong_input_shape_is_rejected() {
        let d = ModelDescriptor::parse(r#"{"format":"mock","input_shape":[224,224,3]}"#).unwrap();
        assert!(matches!(d.validate(), Err(LoadError::ShapeMismatch(_))));
    }

    #[test]
    fn reordered_labels_are_rejected() {
        let d = ModelDescriptor::parse(
            r#"{"format":"mock","labels":["rose","daisy","dandelion","sunflower","tulip"]}"#,
        )
        .unwrap();
        assert!(matches!(d.validate(), Err(LoadError::ShapeMismatch(_))));
    }

    #[test]
    fn fixed_scores_must_match_label_count() {
        let d = ModelDescriptor::parse(r#"{"format":"mock","scores":[0.1,0.9]}"#).unwrap();
        assert!(matches!(d.validate(), Err(LoadError::ShapeMismatch(_))));
    }

    #[test]
    fn onnx_requires_weights() {
        let d = ModelDescriptor::parse(r#"{"format":"onnx"}"#).unwrap();
        assert!(matches!(d.validate(), Err(LoadError::Parse(_))));
    }

    #[test]
    fn unknown_format_fails_to_parse() {
        assert!(matches!(
            ModelDescriptor::parse(r#"{"format":"tfjs-layers"}"#),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn batched_shape() {
        assert_eq!(FLOWER_INPUT_SHAPE.batched(), [1, 244, 244, 3]);
    }
}
