use serde::{Deserialize, Serialize};

pub const FLOWER_LABELS: [&str; 5] = ["daisy", "dandelion", "rose", "sunflower", "tulip"];

/// Fixed, ordered class labels of a classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    pub fn flowers() -> Self {
        Self::new(FLOWER_LABELS)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::flowers()
    }
}

/// Per-class scores aligned with a [`LabelSet`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub scores: Vec<f32>,
}

impl PredictionResult {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// Index of the highest score. Ties go to the lowest index; NaN never wins.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in self.scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn predicted_label<'a>(&self, labels: &'a LabelSet) -> Option<&'a str> {
        self.argmax().and_then(|i| labels.get(i))
    }

    /// Score of the winning class.
    pub fn confidence(&self) -> Option<f32> {
        self.argmax().map(|i| self.scores[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(scores: &[f32]) -> Option<String> {
        PredictionResult::new(scores.to_vec())
            .predicted_label(&LabelSet::flowers())
            .map(str::to_string)
    }

    #[test]
    fn unique_maximum_selects_its_label() {
        for (i, name) in FLOWER_LABELS.iter().enumerate() {
            let mut scores = vec![0.1; 5];
            scores[i] = 0.6;
            assert_eq!(label(&scores).as_deref(), Some(*name));
        }
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        assert_eq!(label(&[0.5, 0.5, 0.1, 0.1, 0.1]).as_deref(), Some("daisy"));
        assert_eq!(label(&[0.1, 0.1, 0.4, 0.4, 0.4]).as_deref(), Some("rose"));
    }

    #[test]
    fn rose_vector() {
        assert_eq!(label(&[0.1, 0.05, 0.7, 0.1, 0.05]).as_deref(), Some("rose"));
    }

    #[test]
    fn nan_scores_are_ignored() {
        assert_eq!(label(&[f32::NAN, 0.2, 0.1, 0.0, 0.0]).as_deref(), Some("dandelion"));
        assert_eq!(label(&[f32::NAN; 5]), None);
        assert_eq!(label(&[]), None);
    }

    #[test]
    fn out_of_range_index_has_no_label() {
        let r = PredictionResult::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(r.argmax(), Some(5));
        assert_eq!(r.predicted_label(&LabelSet::flowers()), None);
    }

    #[test]
    fn confidence_is_the_winning_score() {
        let r = PredictionResult::new(vec![0.2, 0.8, 0.0, 0.0, 0.0]);
        assert_eq!(r.confidence(), Some(0.8));
    }
}
