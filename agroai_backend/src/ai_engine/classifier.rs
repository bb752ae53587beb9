//! ndarray-backed leaf image classifier.
//!
//! A small two-layer network over byte-histogram features. Weights come from
//! a pretrained export on disk; training happens elsewhere.

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Input features: normalized 64-bin byte histogram of the image.
pub const FEATURE_BINS: usize = 64;
/// Hidden layer width.
pub const HIDDEN_UNITS: usize = 32;
/// Output classes, one per known crop/disease label.
pub const NUM_CLASSES: usize = 25;

/// Two-layer classifier: histogram features -> hidden (relu) -> softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafClassifier {
    weights_1: Array2<f64>,
    bias_1: Array1<f64>,
    weights_2: Array2<f64>,
    bias_2: Array1<f64>,
}

impl LeafClassifier {
    /// Load pretrained weights from a JSON export.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read classifier weights from {}", path.display()))?;
        let model: Self =
            serde_json::from_str(&raw).context("classifier weight file is not valid JSON")?;
        model.validate()?;
        Ok(model)
    }

    /// Randomly initialized model. Only useful for tests and smoke runs;
    /// predictions are meaningless without trained weights.
    pub fn with_random_weights() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let weights_1 =
            Array2::from_shape_fn((FEATURE_BINS, HIDDEN_UNITS), |_| rng.gen_range(-0.1..0.1));
        let weights_2 =
            Array2::from_shape_fn((HIDDEN_UNITS, NUM_CLASSES), |_| rng.gen_range(-0.1..0.1));
        Self {
            weights_1,
            bias_1: Array1::zeros(HIDDEN_UNITS),
            weights_2,
            bias_2: Array1::zeros(NUM_CLASSES),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.weights_1.dim() == (FEATURE_BINS, HIDDEN_UNITS),
            "layer 1 weights have shape {:?}, expected ({FEATURE_BINS}, {HIDDEN_UNITS})",
            self.weights_1.dim()
        );
        ensure!(self.bias_1.len() == HIDDEN_UNITS, "layer 1 bias length mismatch");
        ensure!(
            self.weights_2.dim() == (HIDDEN_UNITS, NUM_CLASSES),
            "layer 2 weights have shape {:?}, expected ({HIDDEN_UNITS}, {NUM_CLASSES})",
            self.weights_2.dim()
        );
        ensure!(self.bias_2.len() == NUM_CLASSES, "layer 2 bias length mismatch");
        Ok(())
    }

    /// Byte-histogram features for an image, normalized to sum to 1.
    pub fn features(image: &[u8]) -> Array1<f64> {
        let mut bins = Array1::zeros(FEATURE_BINS);
        for &byte in image {
            bins[byte as usize * FEATURE_BINS / 256] += 1.0;
        }
        let total = image.len().max(1) as f64;
        bins.mapv_inplace(|count| count / total);
        bins
    }

    /// Class probability distribution for an image.
    pub fn forward(&self, features: &Array1<f64>) -> Array1<f64> {
        let hidden = (features.dot(&self.weights_1) + &self.bias_1).mapv(|v| v.max(0.0));
        let logits = hidden.dot(&self.weights_2) + &self.bias_2;
        softmax(&logits)
    }
}

fn softmax(logits: &Array1<f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}
