pub mod fields;
pub mod ocr;
pub mod orchestrator;
pub mod preprocess;
pub mod types;

pub use fields::*;
pub use ocr::*;
pub use orchestrator::*;
pub use preprocess::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("Invalid extraction rule for field {field}: {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("Duplicate field name in rule registry: {0}")]
    DuplicateField(String),
}
