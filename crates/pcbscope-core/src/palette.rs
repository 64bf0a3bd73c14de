// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static HSV color tables describing common component body colors.
//
// HSV values follow the 8-bit convention used by most vision toolkits:
// hue in [0, 180], saturation and value in [0, 255]. Bounds are inclusive.

use serde::Serialize;

/// A named inclusive HSV interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorRange {
    pub name: &'static str,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(name: &'static str, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { name, lower, upper }
    }

    /// Whether an `[h, s, v]` triple falls inside this range on every channel.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Component colors used by the trace-visualization branch.
///
/// Declaration order is significant: per-range diagnostics are reported in
/// this order.
pub static COMPONENT_COLOR_RANGES: [ColorRange; 12] = [
    // Black bodies (SMD parts, resistors, ICs)
    ColorRange::new("black_dark", [0, 0, 0], [180, 255, 50]),
    ColorRange::new("black_medium", [0, 0, 40], [180, 50, 100]),
    // Blue (capacitors, connectors)
    ColorRange::new("blue_light", [90, 30, 100], [120, 255, 255]),
    ColorRange::new("blue_dark", [100, 50, 50], [130, 200, 200]),
    // Green (resistors, markings)
    ColorRange::new("green", [40, 30, 30], [80, 255, 255]),
    // Brown / orange (ICs, transistors, inductors)
    ColorRange::new("brown1", [0, 50, 50], [15, 255, 255]),
    ColorRange::new("brown2", [10, 50, 50], [25, 255, 255]),
    ColorRange::new("orange", [5, 100, 100], [20, 255, 255]),
    // Red
    ColorRange::new("red", [0, 50, 50], [10, 255, 255]),
    ColorRange::new("red_dark", [170, 50, 50], [180, 255, 255]),
    // Yellow
    ColorRange::new("yellow", [20, 50, 50], [35, 255, 255]),
    // Metallic / silver
    ColorRange::new("metallic", [0, 0, 150], [180, 50, 255]),
];

/// Reduced component table used by the OCR-preparation branch's diagnostic
/// trace map. Tuned looser on blue and without the red/yellow/metallic
/// families, which tend to swallow silkscreen text.
pub static OCR_COMPONENT_COLOR_RANGES: [ColorRange; 5] = [
    ColorRange::new("black", [0, 0, 0], [180, 255, 50]),
    ColorRange::new("blue", [100, 50, 50], [130, 255, 255]),
    ColorRange::new("green", [40, 30, 30], [80, 255, 255]),
    ColorRange::new("brown1", [10, 50, 50], [20, 255, 255]),
    ColorRange::new("brown2", [0, 50, 50], [10, 255, 255]),
];

/// Human-readable color families covered by [`COMPONENT_COLOR_RANGES`].
pub const COMPONENT_COLOR_FAMILIES: [&str; 7] = [
    "Black (SMD)",
    "Blue (Caps)",
    "Green (Resistors)",
    "Brown/Orange (ICs)",
    "Red",
    "Yellow",
    "Metallic",
];
