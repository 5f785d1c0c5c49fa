//! Scan orchestration: normalize → OCR → parse for one request.
//!
//! Each request is independent and stateless; the pipeline object owns no
//! mutable state and is safe to share behind an `Arc` across workers.

use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::pipeline::diagnostic;

use super::fields::{extract_fields, RuleRegistry};
use super::ocr::extract_text;
use super::preprocess::{ImageNormalizer, ScanNormalizer};
use super::types::{ExtractionWarning, LabExtraction, OcrEngine, ScanOutcome};
use super::ExtractionError;

/// OCR mean confidence below this gets a review-UI warning.
const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Composes the extraction stages for one kind of document.
pub struct ScanPipeline {
    normalizer: Box<dyn ImageNormalizer>,
    engine: Box<dyn OcrEngine>,
    registry: RuleRegistry,
}

impl ScanPipeline {
    pub fn new(
        normalizer: Box<dyn ImageNormalizer>,
        engine: Box<dyn OcrEngine>,
        registry: RuleRegistry,
    ) -> Self {
        Self {
            normalizer,
            engine,
            registry,
        }
    }

    /// Production pipeline for liver function test reports.
    pub fn liver_panel(engine: Box<dyn OcrEngine>) -> Self {
        Self::new(
            Box::new(ScanNormalizer::new()),
            engine,
            RuleRegistry::liver_panel(),
        )
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run one extraction request over raw image bytes.
    ///
    /// Normalization failure is a hard error — the caller must not proceed.
    /// OCR failure degrades to `ScanOutcome::OcrFailed` (manual entry).
    /// Parsing is total, so a successful OCR always yields a complete report.
    pub fn scan(&self, image_bytes: &[u8]) -> Result<ScanOutcome, ExtractionError> {
        let scan_id = Uuid::new_v4();

        let normalized = self.normalizer.normalize(image_bytes)?;

        // Best-effort diagnostic dump; failure never blocks the scan.
        let dump_dir = diagnostic::dump_dir_for(&scan_id);
        if let Some(dir) = &dump_dir {
            match normalized.png_bytes() {
                Ok(png) => diagnostic::dump_binary(dir, "01-normalized.png", &png),
                Err(e) => warn!(error = %e, "Diagnostic dump: could not encode normalized image"),
            }
        }

        let page = match extract_text(self.engine.as_ref(), &normalized) {
            Some(page) => page,
            None => {
                info!(%scan_id, "Scan degraded to manual entry: OCR unavailable");
                return Ok(ScanOutcome::OcrFailed);
            }
        };

        if let Some(dir) = &dump_dir {
            diagnostic::dump_text(dir, "02-ocr-text.txt", &page.text);
        }

        let fields = extract_fields(&page.text, &self.registry);
        let missing = fields.missing_fields();

        let mut warnings = Vec::new();
        if page.confidence < LOW_CONFIDENCE_THRESHOLD {
            warnings.push(ExtractionWarning::LowConfidence {
                confidence: page.confidence,
            });
        }

        let extraction = LabExtraction {
            scan_id,
            text: page.text,
            confidence: page.confidence,
            fields,
            missing,
            warnings,
        };

        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "03-extraction.json", &extraction);
        }

        info!(
            %scan_id,
            fields = extraction.fields.len(),
            missing = extraction.missing.len(),
            confidence = extraction.confidence,
            "Lab scan extracted"
        );

        Ok(ScanOutcome::Extracted(extraction))
    }

    /// Convenience: read an image file and scan it.
    pub fn scan_path(&self, path: &Path) -> Result<ScanOutcome, ExtractionError> {
        let bytes = std::fs::read(path)?;
        self.scan(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::preprocess::MockNormalizer;

    fn pipeline_with_engine(engine: MockOcrEngine) -> ScanPipeline {
        ScanPipeline::new(
            Box::new(MockNormalizer::new()),
            Box::new(engine),
            RuleRegistry::liver_panel(),
        )
    }

    #[test]
    fn scan_extracts_fields_from_ocr_text() {
        let engine = MockOcrEngine::new("TOTAL BILIRUBIN 1.2 DIRECT BILIRUBIN 0.3", 0.9);
        let outcome = pipeline_with_engine(engine).scan(b"fake").unwrap();

        let extraction = outcome.extraction().expect("should extract");
        assert_eq!(
            extraction.fields.get("Total_Bilirubin").unwrap().value(),
            Some("1.2")
        );
        assert_eq!(
            extraction.fields.get("Direct_Bilirubin").unwrap().value(),
            Some("0.3")
        );
        assert_eq!(extraction.missing.len(), 7);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn scan_degrades_to_ocr_failed_on_engine_error() {
        let outcome = pipeline_with_engine(MockOcrEngine::failing())
            .scan(b"fake")
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::OcrFailed));
    }

    #[test]
    fn scan_fails_hard_on_normalizer_error() {
        let pipeline = ScanPipeline::new(
            Box::new(MockNormalizer::failing()),
            Box::new(MockOcrEngine::new("irrelevant", 1.0)),
            RuleRegistry::liver_panel(),
        );
        assert!(pipeline.scan(b"fake").is_err());
    }

    #[test]
    fn scan_flags_low_confidence() {
        let engine = MockOcrEngine::new("ALBUMIN 3.9", 0.35);
        let outcome = pipeline_with_engine(engine).scan(b"fake").unwrap();

        let extraction = outcome.extraction().unwrap();
        assert!(matches!(
            extraction.warnings.as_slice(),
            [ExtractionWarning::LowConfidence { .. }]
        ));
    }

    #[test]
    fn scan_report_always_covers_registry() {
        let engine = MockOcrEngine::new("", 0.9);
        let pipeline = pipeline_with_engine(engine);
        let outcome = pipeline.scan(b"fake").unwrap();

        let extraction = outcome.extraction().unwrap();
        assert_eq!(extraction.fields.len(), pipeline.registry().len());
        assert_eq!(extraction.missing.len(), pipeline.registry().len());
    }

    #[test]
    fn scan_path_propagates_missing_file_as_io_error() {
        let pipeline = pipeline_with_engine(MockOcrEngine::new("x", 1.0));
        let result = pipeline.scan_path(Path::new("/nonexistent/report.jpg"));
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }
}
