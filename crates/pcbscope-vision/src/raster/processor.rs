// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Board image loading and boundary encoding. Decodes arbitrary input formats
// into a normalized RGB + grayscale pair, and encodes pipeline results as
// JPEG bytes, base64 strings, or data URIs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GrayImage, RgbImage};
use pcbscope_core::error::{PcbError, Result};
use tracing::{debug, info, instrument};

/// A decoded board photo, normalized for the pipeline.
///
/// The alpha channel (if any) is dropped on construction. Both the RGB and
/// grayscale views share the same dimensions, which every buffer derived
/// from this image inherits.
///
/// ```ignore
/// let board = BoardImage::from_bytes(&upload)?;
/// let overlay = TraceEnhancer::default().process(&board)?;
/// let jpeg = encode_jpeg_rgb(&overlay, 90)?;
/// ```
#[derive(Debug, Clone)]
pub struct BoardImage {
    rgb: RgbImage,
    gray: GrayImage,
    /// Whether the source carried color information (not luma-only).
    has_color: bool,
}

impl BoardImage {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| PcbError::Decode(format!("failed to decode board image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Board image decoded from bytes"
        );
        Self::from_dynamic(img)
    }

    /// Load a board image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            PcbError::Decode(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Board image loaded");
        Self::from_dynamic(img)
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PcbError::InvalidImage(format!(
                "image has zero area ({}x{})",
                image.width(),
                image.height()
            )));
        }
        let has_color = image.color().has_color();
        let rgb = image.to_rgb8();
        let gray = image.to_luma8();
        Ok(Self {
            rgb,
            gray,
            has_color,
        })
    }

    /// Wrap an RGB buffer.
    pub fn from_rgb(rgb: RgbImage) -> Result<Self> {
        Self::from_dynamic(DynamicImage::ImageRgb8(rgb))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    /// Total pixel count.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Three-channel view (grayscale inputs are replicated across channels).
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luma view.
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Whether the source image had chroma. Luma-only inputs skip color
    /// segmentation in the OCR branch.
    pub fn has_color(&self) -> bool {
        self.has_color
    }
}

// -- Output -------------------------------------------------------------------

/// Encode an RGB buffer as JPEG bytes with the given quality (1-100).
pub fn encode_jpeg_rgb(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|err| PcbError::Encode(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode a grayscale buffer as JPEG bytes with the given quality (1-100).
pub fn encode_jpeg_gray(image: &GrayImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|err| PcbError::Encode(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode a grayscale buffer as lossless PNG bytes (used for binary images
/// handed to OCR engines, where JPEG ringing would damage glyph edges).
pub fn encode_png_gray(image: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|err| PcbError::Encode(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Standard base64 of arbitrary bytes.
pub fn to_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// `data:image/jpeg;base64,...` URI suitable for direct embedding.
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", to_base64(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};

    #[test]
    fn alpha_is_dropped_and_views_share_dimensions() {
        let rgba = RgbaImage::from_pixel(7, 5, Rgba([10, 20, 30, 0]));
        let board = BoardImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(board.rgb().get_pixel(3, 3), &Rgb([10, 20, 30]));
        assert_eq!(board.gray().dimensions(), (7, 5));
        assert!(board.has_color());
    }

    #[test]
    fn luma_input_is_flagged_colorless() {
        let gray = GrayImage::from_pixel(4, 4, Luma([90]));
        let board = BoardImage::from_dynamic(DynamicImage::ImageLuma8(gray)).unwrap();
        assert!(!board.has_color());
        assert_eq!(board.rgb().get_pixel(0, 0), &Rgb([90, 90, 90]));
    }

    #[test]
    fn zero_area_is_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        assert!(matches!(
            BoardImage::from_dynamic(empty),
            Err(PcbError::InvalidImage(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = BoardImage::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PcbError::Decode(_)));
    }

    #[test]
    fn jpeg_round_trips_through_decoder() {
        let rgb = RgbImage::from_pixel(16, 8, Rgb([200, 100, 50]));
        let jpeg = encode_jpeg_rgb(&rgb, 90).unwrap();
        let board = BoardImage::from_bytes(&jpeg).unwrap();
        assert_eq!(board.dimensions(), (16, 8));
    }

    #[test]
    fn data_uri_has_jpeg_prefix() {
        let uri = jpeg_data_uri(&[0xff, 0xd8, 0xff]);
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");
    }
}
