use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::FieldReport;
use super::ExtractionError;

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    /// Mean text confidence reported by the engine, 0.0–1.0.
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine: Send + Sync {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// Warnings about extraction quality, surfaced to the review UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExtractionWarning {
    LowConfidence { confidence: f32 },
}

/// One completed scan: raw text plus the parsed field report.
///
/// `fields` always covers every declared rule; the `missing` companion list
/// is what the operator is asked to fill in by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabExtraction {
    pub scan_id: Uuid,
    pub text: String,
    pub confidence: f32,
    pub fields: FieldReport,
    pub missing: Vec<String>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Outcome of a scan request.
///
/// Normalizer failures are hard errors (the caller must not proceed); an OCR
/// engine failure is not — photographed documents are noisy, so the request
/// degrades to manual entry instead of aborting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// The OCR engine failed; the operator must enter all fields manually.
    OcrFailed,
    /// Text was extracted; some fields may still need manual correction.
    Extracted(LabExtraction),
}

impl ScanOutcome {
    pub fn extraction(&self) -> Option<&LabExtraction> {
        match self {
            ScanOutcome::Extracted(extraction) => Some(extraction),
            ScanOutcome::OcrFailed => None,
        }
    }
}
