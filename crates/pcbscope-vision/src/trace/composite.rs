// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-viewable trace overlay.

use image::{Rgb, RgbImage};
use pcbscope_core::config::TraceConfig;

use crate::kernels::BinaryMask;
use crate::kernels::filter::{Border, gaussian_blur_sized};

/// Renders trace pixels in a solid color over a dimmed copy of the board.
#[derive(Debug, Clone)]
pub struct Compositor {
    overlay: Rgb<u8>,
    dim_factor: f32,
    blur_kernel: u32,
}

impl Compositor {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            overlay: Rgb(config.overlay_color),
            dim_factor: config.dim_factor,
            blur_kernel: config.composite_blur_kernel,
        }
    }

    pub fn compose(&self, original: &RgbImage, traces: &BinaryMask) -> RgbImage {
        let composite = RgbImage::from_fn(original.width(), original.height(), |x, y| {
            if traces.is_set(x, y) {
                self.overlay
            } else {
                let [r, g, b] = original.get_pixel(x, y).0;
                Rgb([self.dim(r), self.dim(g), self.dim(b)])
            }
        });
        gaussian_blur_sized(&composite, self.blur_kernel, Border::Reflect101)
    }

    #[inline]
    fn dim(&self, v: u8) -> u8 {
        (v as f32 * self.dim_factor) as u8
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_dimmed_and_traces_are_blue() {
        let board = RgbImage::from_pixel(30, 30, Rgb([100, 230, 220]));
        let traces = BinaryMask::from_fn(30, 30, |_, y| (14..17).contains(&y));
        let out = Compositor::default().compose(&board, &traces);
        assert_eq!(out.get_pixel(5, 3), &Rgb([50, 115, 110]));
        assert_eq!(out.get_pixel(5, 15), &Rgb([0, 0, 255]));
        assert_eq!(out.dimensions(), (30, 30));
    }
}
