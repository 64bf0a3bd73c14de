// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic stage recording.
//
// Each pipeline invocation owns a `StageLog`; nothing is shared between
// invocations. Stages are append-only and handed back with the result.

use image::{GrayImage, RgbImage};
use pcbscope_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::kernels::BinaryMask;
use crate::raster::{encode_jpeg_gray, encode_jpeg_rgb, to_base64};

/// The buffer captured at one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageImage {
    Gray(GrayImage),
    Color(RgbImage),
}

impl StageImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            StageImage::Gray(img) => img.dimensions(),
            StageImage::Color(img) => img.dimensions(),
        }
    }
}

/// One recorded intermediate buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStage {
    pub label: &'static str,
    pub description: &'static str,
    pub image: StageImage,
}

impl ProcessingStage {
    pub fn is_grayscale(&self) -> bool {
        matches!(self.image, StageImage::Gray(_))
    }

    /// Encode for transport: JPEG at `quality`, base64.
    pub fn to_payload(&self, quality: u8) -> Result<StagePayload> {
        let jpeg = match &self.image {
            StageImage::Gray(img) => encode_jpeg_gray(img, quality)?,
            StageImage::Color(img) => encode_jpeg_rgb(img, quality)?,
        };
        Ok(StagePayload {
            label: self.label.to_string(),
            description: self.description.to_string(),
            image_base64: to_base64(&jpeg),
            is_grayscale: self.is_grayscale(),
        })
    }
}

/// Boundary form of a [`ProcessingStage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePayload {
    pub label: String,
    pub description: String,
    pub image_base64: String,
    pub is_grayscale: bool,
}

/// Append-only per-invocation stage builder.
///
/// A disabled log accepts every `record_*` call and keeps nothing, so the
/// pipelines can record unconditionally.
#[derive(Debug, Default)]
pub struct StageLog {
    enabled: bool,
    stages: Vec<ProcessingStage>,
}

impl StageLog {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            stages: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_gray(&mut self, label: &'static str, description: &'static str, img: &GrayImage) {
        self.push(label, description, || StageImage::Gray(img.clone()));
    }

    pub fn record_mask(
        &mut self,
        label: &'static str,
        description: &'static str,
        mask: &BinaryMask,
    ) {
        self.push(label, description, || StageImage::Gray(mask.as_gray().clone()));
    }

    pub fn record_color(&mut self, label: &'static str, description: &'static str, img: &RgbImage) {
        self.push(label, description, || StageImage::Color(img.clone()));
    }

    fn push(
        &mut self,
        label: &'static str,
        description: &'static str,
        image: impl FnOnce() -> StageImage,
    ) {
        if self.enabled {
            self.stages.push(ProcessingStage {
                label,
                description,
                image: image(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.label).collect()
    }

    pub fn into_stages(self) -> Vec<ProcessingStage> {
        self.stages
    }
}

/// Encode a list of stages for transport.
pub fn encode_stages(stages: &[ProcessingStage], quality: u8) -> Result<Vec<StagePayload>> {
    stages.iter().map(|s| s.to_payload(quality)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn disabled_log_keeps_nothing() {
        let mut log = StageLog::disabled();
        log.record_gray("Grayscale", "luma", &GrayImage::new(2, 2));
        assert!(log.is_empty());
        assert!(!log.is_enabled());
    }

    #[test]
    fn enabled_log_preserves_order_and_mode() {
        let mut log = StageLog::enabled();
        log.record_color("Original", "input", &RgbImage::new(3, 3));
        log.record_mask("Mask", "mask", &BinaryMask::new(3, 3));
        assert_eq!(log.labels(), vec!["Original", "Mask"]);
        let stages = log.into_stages();
        assert!(!stages[0].is_grayscale());
        assert!(stages[1].is_grayscale());
    }

    #[test]
    fn payload_is_base64_jpeg() {
        let stage = ProcessingStage {
            label: "Original",
            description: "input",
            image: StageImage::Color(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))),
        };
        let payload = stage.to_payload(85).unwrap();
        // Base64 of the JPEG SOI marker 0xFFD8FF.
        assert!(payload.image_base64.starts_with("/9j/"));
        assert!(!payload.is_grayscale);

        let gray = ProcessingStage {
            label: "Gray",
            description: "luma",
            image: StageImage::Gray(GrayImage::from_pixel(8, 8, Luma([9]))),
        };
        assert!(encode_stages(&[gray], 85).unwrap()[0].is_grayscale);
    }
}
