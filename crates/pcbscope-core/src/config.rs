// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every tuning constant of the trace, OCR-preparation, quality and text
// stages lives here. Defaults reproduce the reference tuning; a JSON file may
// override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PcbError, Result};

/// Parameters for one adaptive threshold. The local mean is always
/// Gaussian weighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptiveThresholdConfig {
    /// Neighbourhood side length in pixels; must be odd and >= 3.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub bias: i32,
}

/// Trace-visualization branch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Gaussian pre-smoothing kernel side (odd).
    pub blur_kernel: u32,
    /// Inverted adaptive threshold (dark ink is foreground).
    pub adaptive: AdaptiveThresholdConfig,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Square structuring element used to grow the component mask.
    pub component_dilate_kernel: u32,
    pub component_dilate_iterations: u32,
    /// Neighbourhood radius for inpainting.
    pub inpaint_radius: u32,
    /// Gap-bridging dilation of the combined trace candidates.
    pub bridge_dilate_kernel: u32,
    pub bridge_dilate_iterations: u32,
    /// Trim erosion applied after bridging.
    pub trim_erode_kernel: u32,
    pub trim_erode_iterations: u32,
    /// Final pinhole-filling close.
    pub close_kernel: u32,
    /// Overlay color as RGB.
    pub overlay_color: [u8; 3],
    /// Brightness factor applied to the background of the composite.
    pub dim_factor: f32,
    /// Smoothing kernel applied to the composite (odd).
    pub composite_blur_kernel: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            adaptive: AdaptiveThresholdConfig {
                block_size: 19,
                bias: 9,
            },
            canny_low: 50.0,
            canny_high: 150.0,
            component_dilate_kernel: 7,
            component_dilate_iterations: 2,
            inpaint_radius: 5,
            bridge_dilate_kernel: 3,
            bridge_dilate_iterations: 2,
            trim_erode_kernel: 2,
            trim_erode_iterations: 1,
            close_kernel: 3,
            overlay_color: [0, 0, 255],
            dim_factor: 0.5,
            composite_blur_kernel: 3,
        }
    }
}

/// OCR-preparation branch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrPrepConfig {
    /// Bilateral filter window diameter.
    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    /// Gaussian sigma of the unsharp mask.
    pub unsharp_sigma: f32,
    /// Weight of the original in `amount * img - (amount - 1) * blur`.
    pub unsharp_amount: f32,
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid is `clahe_tiles x clahe_tiles`.
    pub clahe_tiles: u32,
    /// Gaussian smoothing before binarization (odd).
    pub smooth_kernel: u32,
    /// Non-inverted adaptive threshold (dark text on light background).
    pub adaptive: AdaptiveThresholdConfig,
    /// Structuring element for stroke mending and speckle cleanup.
    pub stroke_kernel: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub trace_dilate_kernel: u32,
    pub trace_dilate_iterations: u32,
    pub trace_erode_iterations: u32,
    /// Close/open kernel applied to the diagnostic component mask.
    pub component_cleanup_kernel: u32,
    pub inpaint_mask_dilate_kernel: u32,
    pub inpaint_mask_dilate_iterations: u32,
    pub inpaint_radius: u32,
    /// Blend weight of the blue overlay in the diagnostic trace image.
    pub overlay_alpha: f32,
}

impl Default for OcrPrepConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            unsharp_sigma: 2.0,
            unsharp_amount: 1.5,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            smooth_kernel: 3,
            adaptive: AdaptiveThresholdConfig {
                block_size: 11,
                bias: 2,
            },
            stroke_kernel: 2,
            canny_low: 50.0,
            canny_high: 150.0,
            trace_dilate_kernel: 3,
            trace_dilate_iterations: 2,
            trace_erode_iterations: 1,
            component_cleanup_kernel: 5,
            inpaint_mask_dilate_kernel: 5,
            inpaint_mask_dilate_iterations: 2,
            inpaint_radius: 3,
            overlay_alpha: 0.3,
        }
    }
}

/// Frame-quality scoring tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Laplacian variance that maps to a blur score of 1.0.
    pub blur_normalization: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            blur_normalization: 5000.0,
        }
    }
}

/// OCR token normalization and designator matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Tokens shorter than this (after trimming) are dropped.
    pub min_token_len: usize,
    /// Tokens at or below this native (0–100) confidence are dropped.
    pub min_native_confidence: i32,
    /// Similarity a fuzzy match must strictly exceed.
    pub fuzzy_threshold: f64,
    /// Characters the recognizer is allowed to emit.
    pub char_whitelist: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            min_native_confidence: 40,
            fuzzy_threshold: 0.6,
            char_whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".into(),
        }
    }
}

/// Boundary encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG quality of the overlay-only output.
    pub overlay_jpeg_quality: u8,
    /// JPEG quality of each diagnostic stage image.
    pub stage_jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            overlay_jpeg_quality: 90,
            stage_jpeg_quality: 85,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub trace: TraceConfig,
    pub ocr_prep: OcrPrepConfig,
    pub quality: QualityConfig,
    pub text: TextConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Reject parameter combinations the kernels cannot honour.
    pub fn validate(&self) -> Result<()> {
        let t = &self.trace;
        check_adaptive("trace.adaptive", &t.adaptive)?;
        check_odd("trace.blur_kernel", t.blur_kernel)?;
        check_odd("trace.composite_blur_kernel", t.composite_blur_kernel)?;
        check_nonzero("trace.component_dilate_kernel", t.component_dilate_kernel)?;
        check_nonzero("trace.bridge_dilate_kernel", t.bridge_dilate_kernel)?;
        check_nonzero("trace.trim_erode_kernel", t.trim_erode_kernel)?;
        check_nonzero("trace.close_kernel", t.close_kernel)?;
        check_nonzero("trace.inpaint_radius", t.inpaint_radius)?;
        check_canny("trace", t.canny_low, t.canny_high)?;
        if !(0.0..=1.0).contains(&t.dim_factor) {
            return Err(invalid("trace.dim_factor must be within [0, 1]"));
        }

        let o = &self.ocr_prep;
        check_adaptive("ocr_prep.adaptive", &o.adaptive)?;
        check_odd("ocr_prep.smooth_kernel", o.smooth_kernel)?;
        check_nonzero("ocr_prep.bilateral_diameter", o.bilateral_diameter)?;
        check_nonzero("ocr_prep.stroke_kernel", o.stroke_kernel)?;
        check_nonzero("ocr_prep.trace_dilate_kernel", o.trace_dilate_kernel)?;
        check_nonzero("ocr_prep.component_cleanup_kernel", o.component_cleanup_kernel)?;
        check_nonzero("ocr_prep.inpaint_mask_dilate_kernel", o.inpaint_mask_dilate_kernel)?;
        check_nonzero("ocr_prep.inpaint_radius", o.inpaint_radius)?;
        check_nonzero("ocr_prep.clahe_tiles", o.clahe_tiles)?;
        check_canny("ocr_prep", o.canny_low, o.canny_high)?;
        if o.clahe_clip_limit <= 0.0 {
            return Err(invalid("ocr_prep.clahe_clip_limit must be positive"));
        }
        if o.unsharp_sigma <= 0.0 || o.bilateral_sigma_color <= 0.0 || o.bilateral_sigma_space <= 0.0
        {
            return Err(invalid("ocr_prep sigmas must be positive"));
        }
        if !(0.0..=1.0).contains(&o.overlay_alpha) {
            return Err(invalid("ocr_prep.overlay_alpha must be within [0, 1]"));
        }

        if self.quality.blur_normalization <= 0.0 {
            return Err(invalid("quality.blur_normalization must be positive"));
        }

        if !(0.0..1.0).contains(&self.text.fuzzy_threshold) {
            return Err(invalid("text.fuzzy_threshold must be within [0, 1)"));
        }

        for (name, q) in [
            ("output.overlay_jpeg_quality", self.output.overlay_jpeg_quality),
            ("output.stage_jpeg_quality", self.output.stage_jpeg_quality),
        ] {
            if !(1..=100).contains(&q) {
                return Err(invalid(format!("{name} must be within 1..=100")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> PcbError {
    PcbError::InvalidConfig(msg.into())
}

fn check_nonzero(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(invalid(format!("{name} must be non-zero")));
    }
    Ok(())
}

fn check_odd(name: &str, value: u32) -> Result<()> {
    if value == 0 || value % 2 == 0 {
        return Err(invalid(format!("{name} must be odd, got {value}")));
    }
    Ok(())
}

fn check_adaptive(name: &str, cfg: &AdaptiveThresholdConfig) -> Result<()> {
    if cfg.block_size < 3 || cfg.block_size % 2 == 0 {
        return Err(invalid(format!(
            "{name}.block_size must be odd and >= 3, got {}",
            cfg.block_size
        )));
    }
    Ok(())
}

fn check_canny(name: &str, low: f32, high: f32) -> Result<()> {
    if low < 0.0 || high < low {
        return Err(invalid(format!(
            "{name} canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_reference_tuning() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.trace.adaptive.block_size, 19);
        assert_eq!(cfg.trace.adaptive.bias, 9);
        assert_eq!(cfg.ocr_prep.adaptive.block_size, 11);
        assert_eq!(cfg.ocr_prep.adaptive.bias, 2);
        assert_eq!(cfg.trace.overlay_color, [0, 0, 255]);
        assert_eq!(cfg.output.overlay_jpeg_quality, 90);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = PipelineConfig::from_json_str(
            r#"{ "trace": { "inpaint_radius": 3 }, "text": { "fuzzy_threshold": 0.7 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.trace.inpaint_radius, 3);
        assert_eq!(cfg.trace.blur_kernel, 5);
        assert_eq!(cfg.text.fuzzy_threshold, 0.7);
        assert_eq!(cfg.text.min_native_confidence, 40);
    }

    #[test]
    fn even_block_size_is_rejected() {
        let err = PipelineConfig::from_json_str(
            r#"{ "trace": { "adaptive": { "block_size": 18, "bias": 9 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PcbError::InvalidConfig(_)));
    }

    #[test]
    fn adaptive_method_is_not_configurable() {
        let err = PipelineConfig::from_json_str(
            r#"{ "ocr_prep": { "adaptive": { "method": "mean", "block_size": 11, "bias": 2 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PcbError::Serialization(_)));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = PipelineConfig::from_json_str("{ trace: ").unwrap_err();
        assert!(matches!(err, PcbError::Serialization(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{ "quality": { "blur_normalization": 2500.0 } }"#).unwrap();
        let cfg = PipelineConfig::load(&path).unwrap();
        assert_eq!(cfg.quality.blur_normalization, 2500.0);
    }
}
