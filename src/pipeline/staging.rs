//! Transient staging of uploaded images.
//!
//! Uploads are held in a scoped temp file that is deleted on every exit path
//! — success, parse failure, or panic unwind — so failed requests never
//! accumulate on disk.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::extraction::ExtractionError;

/// An uploaded image staged to disk for the duration of one request.
///
/// The backing file is removed when the value is dropped.
pub struct StagedUpload {
    file: tempfile::NamedTempFile,
}

impl StagedUpload {
    /// Write upload bytes to a fresh temp file.
    pub fn stage(bytes: &[u8]) -> Result<Self, ExtractionError> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(
            path = %file.path().display(),
            size = bytes.len(),
            "Upload staged"
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged bytes back (e.g. to re-run a scan).
    pub fn read(&self) -> Result<Vec<u8>, ExtractionError> {
        Ok(std::fs::read(self.file.path())?)
    }
}
