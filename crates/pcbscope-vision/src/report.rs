// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-free numeric summaries and the static capability description.

use pcbscope_core::palette::{COMPONENT_COLOR_FAMILIES, COMPONENT_COLOR_RANGES};
use serde::{Deserialize, Serialize};

use crate::kernels::BinaryMask;
use crate::trace::components::RangeCount;
use crate::trace::enhancer::TRACE_STAGE_LABELS;

/// Pixel count of one detection method and its share of the image area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodStats {
    pub pixels: u64,
    /// Percentage of the total image area, in [0, 100].
    pub percentage: f64,
}

impl MethodStats {
    pub fn from_mask(mask: &BinaryMask) -> Self {
        Self {
            pixels: mask.count_set(),
            percentage: mask.coverage() * 100.0,
        }
    }
}

/// Analysis-only output of the trace branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceAnalysis {
    pub width: u32,
    pub height: u32,
    pub total_pixels: u64,
    pub adaptive_threshold: MethodStats,
    pub otsu_threshold: MethodStats,
    pub otsu_level: u8,
    pub canny_edges: MethodStats,
    pub component_mask: MethodStats,
    pub final_traces: MethodStats,
    pub component_ranges: Vec<RangeCount>,
}

/// What the trace service can do, for health checks and introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub detection_methods: Vec<String>,
    pub component_colors: Vec<String>,
    pub color_ranges: usize,
    pub stage_labels: Vec<String>,
    pub quality_available: bool,
    pub output_formats: Vec<String>,
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        detection_methods: [
            "adaptive_threshold",
            "otsu_threshold",
            "canny_edges",
            "hsv_component_detection",
            "telea_inpainting",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        component_colors: COMPONENT_COLOR_FAMILIES.iter().map(|s| s.to_string()).collect(),
        color_ranges: COMPONENT_COLOR_RANGES.len(),
        stage_labels: TRACE_STAGE_LABELS.iter().map(|s| s.to_string()).collect(),
        quality_available: cfg!(feature = "quality"),
        output_formats: vec!["overlay_jpeg".into(), "stages".into(), "analysis".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_report_percentage_of_area() {
        let mask = BinaryMask::from_fn(10, 10, |x, _| x < 3);
        let stats = MethodStats::from_mask(&mask);
        assert_eq!(stats.pixels, 30);
        assert!((stats.percentage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn capabilities_describe_the_trace_branch() {
        let caps = capabilities();
        assert_eq!(caps.color_ranges, 12);
        assert_eq!(caps.stage_labels.len(), 10);
        assert_eq!(caps.component_colors.len(), 7);
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains("telea_inpainting"));
    }
}
