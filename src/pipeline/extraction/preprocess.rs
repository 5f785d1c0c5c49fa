//! Image normalization for OCR input.
//!
//! Lab reports arrive as phone photos: rotated, blurry, unevenly lit. The
//! normalizer converts them into the binarized grayscale form the OCR engine
//! reads best — decode, EXIF orientation, grayscale, sharpen, threshold.
//!
//! Invariant: every pixel of a `NormalizedImage` is exactly 0 or 255.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, GrayImage, ImageOutputFormat, Luma, RgbImage};
use tracing::debug;

use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Fixed luminance cutoff for binarization: below → black, at-or-above → white.
/// Tuned on printed lab reports photographed under office lighting.
pub const BINARIZE_THRESHOLD: u8 = 140;

/// 3x3 sharpening kernel (center 32, neighbors −2, divisor 16) applied before
/// thresholding to offset the blur a handheld camera adds to printed text.
const SHARPEN_KERNEL: [i32; 9] = [-2, -2, -2, -2, 32, -2, -2, -2, -2];
const SHARPEN_DIVISOR: i32 = 16;

// ═══════════════════════════════════════════════════════════
// Result type
// ═══════════════════════════════════════════════════════════

/// A binarized grayscale image ready for the OCR engine.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Binarized image — pixel values are exactly 0 or 255.
    pub image: GrayImage,
    /// Original dimensions before any processing.
    pub original_width: u32,
    pub original_height: u32,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG bytes for the OCR engine or diagnostic inspection.
    pub fn png_bytes(&self) -> Result<Vec<u8>, ExtractionError> {
        encode_png(&self.image)
    }
}

// ═══════════════════════════════════════════════════════════
// Normalizer seam
// ═══════════════════════════════════════════════════════════

/// Prepares raw image bytes for OCR.
///
/// Pure bytes-to-image transform — no I/O, no engine calls, fully testable.
pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, image_bytes: &[u8]) -> Result<NormalizedImage, ExtractionError>;
}

/// Production normalizer: decode → EXIF orientation → grayscale → sharpen →
/// binarize at a fixed luminance threshold.
pub struct ScanNormalizer {
    threshold: u8,
}

impl Default for ScanNormalizer {
    fn default() -> Self {
        Self {
            threshold: BINARIZE_THRESHOLD,
        }
    }
}

impl ScanNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom binarization threshold.
    pub fn with_threshold(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl ImageNormalizer for ScanNormalizer {
    fn normalize(&self, image_bytes: &[u8]) -> Result<NormalizedImage, ExtractionError> {
        validate_image_bytes(image_bytes)?;

        let img = image::load_from_memory(image_bytes)
            .map_err(|e| ExtractionError::ImageDecode(format!("Failed to decode image: {e}")))?;
        let (orig_w, orig_h) = img.dimensions();

        // Phone photos embed rotation in EXIF tag 0x0112 — without correction,
        // portrait shots reach the OCR engine sideways.
        let orientation = read_exif_orientation(image_bytes);
        let img = apply_orientation(img, orientation);

        let gray = rgb_to_gray(&img.to_rgb8());
        let sharpened = sharpen(&gray);
        let binary = binarize(&sharpened, self.threshold);

        debug!(
            original = format!("{orig_w}x{orig_h}"),
            orientation,
            threshold = self.threshold,
            "Image normalized for OCR"
        );

        Ok(NormalizedImage {
            image: binary,
            original_width: orig_w,
            original_height: orig_h,
        })
    }
}

/// Mock normalizer for testing — returns a small white binary image.
pub struct MockNormalizer {
    fail: bool,
}

impl MockNormalizer {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl ImageNormalizer for MockNormalizer {
    fn normalize(&self, _image_bytes: &[u8]) -> Result<NormalizedImage, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::ImageProcessing(
                "Mock normalization failure".into(),
            ));
        }
        let image = GrayImage::from_pixel(64, 64, Luma([255]));
        Ok(NormalizedImage {
            image,
            original_width: 64,
            original_height: 64,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Pixel transforms
// ═══════════════════════════════════════════════════════════

/// Validate image bytes before decoding.
/// Returns early error for clearly invalid input — saves decode time.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Convert RGB image to grayscale using ITU-R BT.601 luminance.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = (rgb.width(), rgb.height());
    let mut gray = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = rgb.get_pixel(x, y);
            let luma = (0.299 * p.0[0] as f32
                + 0.587 * p.0[1] as f32
                + 0.114 * p.0[2] as f32) as u8;
            gray.put_pixel(x, y, Luma([luma]));
        }
    }
    gray
}

/// Apply the sharpening convolution with clamp-to-edge sampling.
///
/// On an already-binary image this is the identity: a white center sums to at
/// least 255 and a black center to at most 0 before clamping.
pub fn sharpen(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let mut out = GrayImage::new(w as u32, h as u32);

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0i32;
            for ky in -1i32..=1 {
                for kx in -1i32..=1 {
                    let sx = (x + kx).clamp(0, w - 1);
                    let sy = (y + ky).clamp(0, h - 1);
                    let weight = SHARPEN_KERNEL[((ky + 1) * 3 + (kx + 1)) as usize];
                    acc += weight * img.get_pixel(sx as u32, sy as u32).0[0] as i32;
                }
            }
            let value = (acc / SHARPEN_DIVISOR).clamp(0, 255) as u8;
            out.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }

    out
}

/// Binarize: pixels below the threshold become 0, the rest 255.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = img.get_pixel(x, y).0[0];
            let b = if v < threshold { 0 } else { 255 };
            out.put_pixel(x, y, Luma([b]));
        }
    }
    out
}

/// Encode a grayscale image as PNG bytes.
/// Uses default compression (fast) — images are transient, not archived.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let dynamic = DynamicImage::ImageLuma8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
