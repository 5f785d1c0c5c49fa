use tracing::warn;

use super::preprocess::NormalizedImage;
use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Run OCR on a normalized image, degrading engine failures to `None`.
///
/// OCR on noisy scans is inherently unreliable: an engine-level failure
/// (timeout, unreadable format, internal crash) means "ask the human", not
/// "abort the request". The error is logged and the caller falls back to
/// manual entry.
pub fn extract_text(engine: &dyn OcrEngine, image: &NormalizedImage) -> Option<OcrPageResult> {
    let png_bytes = match image.png_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to encode normalized image for OCR");
            return None;
        }
    };

    match engine.ocr_image(&png_bytes) {
        Ok(page) => Some(page),
        Err(e) => {
            warn!(error = %e, "OCR engine failed, falling back to manual entry");
            None
        }
    }
}

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: std::path::PathBuf,
    lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// Initialize with a tessdata directory. English traineddata must exist.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(
                tessdata_dir.to_path_buf(),
            ));
        }

        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            lang: "eng".to_string(),
        })
    }

    /// Set language(s) for OCR (e.g., "eng", "eng+fra")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.lang = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?;

        let tess = tesseract::Tesseract::new(Some(tessdata_str), Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    text: String,
    confidence: f32,
    fail: bool,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            fail: false,
        }
    }

    /// An engine that always fails, for exercising the degraded path.
    pub fn failing() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            fail: true,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::OcrProcessing(
                "Mock engine failure".into(),
            ));
        }
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}
