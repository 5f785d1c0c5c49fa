use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{assemble_vector, FeatureMap, VECTOR_DIM};
use super::ClassifierError;

/// Binary risk outcome of the pre-trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    NotAtRisk,
    AtRisk,
}

impl RiskLabel {
    /// Map the model's {0, 1} output onto a label.
    pub fn from_binary(value: i64) -> Self {
        if value == 0 {
            RiskLabel::NotAtRisk
        } else {
            RiskLabel::AtRisk
        }
    }

    pub fn is_at_risk(&self) -> bool {
        matches!(self, RiskLabel::AtRisk)
    }
}

/// Opaque pre-trained scoring function.
///
/// Loaded once at process start and shared read-only across requests; the
/// trait keeps the adapter independent of the model runtime and mockable in
/// tests.
pub trait ScoringModel: Send + Sync {
    fn score(&self, vector: &[f32]) -> Result<RiskLabel, ClassifierError>;

    /// Input dimension the model expects.
    fn dimension(&self) -> usize;
}

// ═══════════════════════════════════════════════════════════
// ONNX model (behind `onnx-model` feature)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-model")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;

    use super::{ClassifierError, RiskLabel, ScoringModel, VECTOR_DIM};

    /// Pre-trained risk model via ONNX Runtime.
    ///
    /// Uses interior mutability (Mutex) because `ort::Session::run` requires
    /// `&mut self` while `ScoringModel` exposes `&self` for shared use.
    pub struct OnnxRiskModel {
        session: Mutex<Session>,
    }

    impl OnnxRiskModel {
        /// Load the model from an `.onnx` file.
        pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
            if !model_path.exists() {
                return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    ClassifierError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("Risk model loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl ScoringModel for OnnxRiskModel {
        fn score(&self, vector: &[f32]) -> Result<RiskLabel, ClassifierError> {
            use ort::value::TensorRef;

            if vector.len() != VECTOR_DIM {
                return Err(ClassifierError::DimensionMismatch {
                    expected: VECTOR_DIM,
                    actual: vector.len(),
                });
            }

            let array = ndarray::Array2::from_shape_vec((1, VECTOR_DIM), vector.to_vec())
                .map_err(|e| ClassifierError::Scoring(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&array)
                .map_err(|e| ClassifierError::Scoring(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ClassifierError::Scoring("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| ClassifierError::Scoring(format!("ONNX inference failed: {e}")))?;

            // First output is the predicted label tensor, shape [1].
            let (_, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| ClassifierError::Scoring(format!("Output extraction: {e}")))?;

            let label = *labels
                .first()
                .ok_or_else(|| ClassifierError::Scoring("Empty model output".to_string()))?;

            Ok(RiskLabel::from_binary(label))
        }

        fn dimension(&self) -> usize {
            VECTOR_DIM
        }
    }
}

#[cfg(feature = "onnx-model")]
pub use onnx::OnnxRiskModel;

/// Mock scoring model for testing — returns a fixed label.
pub struct MockScoringModel {
    label: RiskLabel,
}

impl MockScoringModel {
    pub fn returning(label: RiskLabel) -> Self {
        Self { label }
    }
}

impl ScoringModel for MockScoringModel {
    fn score(&self, vector: &[f32]) -> Result<RiskLabel, ClassifierError> {
        if vector.len() != VECTOR_DIM {
            return Err(ClassifierError::DimensionMismatch {
                expected: VECTOR_DIM,
                actual: vector.len(),
            });
        }
        Ok(self.label)
    }

    fn dimension(&self) -> usize {
        VECTOR_DIM
    }
}

// ═══════════════════════════════════════════════════════════
// Adapter
// ═══════════════════════════════════════════════════════════

/// Risk classifier adapter: intake mapping → ordered vector → model → label.
///
/// Holds the process-wide model by handle; construct it once at startup and
/// share it across request workers.
pub struct RiskClassifier {
    model: Arc<dyn ScoringModel>,
}

impl RiskClassifier {
    pub fn new(model: Arc<dyn ScoringModel>) -> Result<Self, ClassifierError> {
        if model.dimension() != VECTOR_DIM {
            return Err(ClassifierError::DimensionMismatch {
                expected: VECTOR_DIM,
                actual: model.dimension(),
            });
        }
        Ok(Self { model })
    }

    /// Predict the risk label for a complete intake mapping.
    ///
    /// Fails on missing/malformed features before the model is ever invoked.
    pub fn predict(&self, features: &FeatureMap) -> Result<RiskLabel, ClassifierError> {
        let vector = assemble_vector(features)?;
        let label = self.model.score(&vector)?;

        debug!(?label, "Risk prediction complete");
        Ok(label)
    }
}
