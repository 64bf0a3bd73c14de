// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary masks: single-channel images whose every pixel is 0 or 255.

use image::{GrayImage, Luma};

/// Value of a set mask pixel.
pub const SET: u8 = 255;

/// A single-channel image whose pixels are exactly 0 (clear) or 255 (set).
///
/// Every constructor normalizes its input, so downstream kernels can rely on
/// the two-valued invariant without re-checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// An all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Build a mask from a per-pixel predicate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { SET } else { 0 }])
        }))
    }

    /// Any non-zero pixel of `gray` becomes set.
    pub fn from_gray_nonzero(gray: &GrayImage) -> Self {
        let mut out = gray.clone();
        for p in out.pixels_mut() {
            p.0[0] = if p.0[0] != 0 { SET } else { 0 };
        }
        Self(out)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.0.put_pixel(x, y, Luma([if value { SET } else { 0 }]));
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> u64 {
        self.0.as_raw().iter().filter(|&&v| v != 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_raw().iter().all(|&v| v == 0)
    }

    /// Set-pixel fraction of the whole image, in [0, 1].
    pub fn coverage(&self) -> f64 {
        let area = self.0.as_raw().len();
        if area == 0 {
            return 0.0;
        }
        self.count_set() as f64 / area as f64
    }

    /// Pixelwise OR.
    pub fn union(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a || b)
    }

    /// Pixelwise `self AND NOT other`.
    pub fn and_not(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a && !b)
    }

    /// Whether any pixel is set in both masks.
    pub fn intersects(&self, other: &Self) -> bool {
        self.0
            .as_raw()
            .iter()
            .zip(other.0.as_raw())
            .any(|(&a, &b)| a != 0 && b != 0)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> Self {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        let raw: Vec<u8> = self
            .0
            .as_raw()
            .iter()
            .zip(other.0.as_raw())
            .map(|(&a, &b)| if f(a != 0, b != 0) { SET } else { 0 })
            .collect();
        // Length matches because both buffers share dimensions.
        Self(GrayImage::from_raw(self.width(), self.height(), raw).unwrap_or_default())
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_normalizes_to_255() {
        let gray = GrayImage::from_raw(3, 1, vec![0, 1, 200]).unwrap();
        let mask = BinaryMask::from_gray_nonzero(&gray);
        assert_eq!(mask.as_gray().as_raw(), &vec![0, 255, 255]);
        assert_eq!(mask.count_set(), 2);
    }

    #[test]
    fn set_algebra() {
        let left = BinaryMask::from_fn(4, 1, |x, _| x < 2);
        let right = BinaryMask::from_fn(4, 1, |x, _| x == 1 || x == 3);
        assert_eq!(left.union(&right).count_set(), 3);
        let diff = left.and_not(&right);
        assert!(diff.is_set(0, 0));
        assert!(!diff.is_set(1, 0));
        assert!(left.intersects(&right));
        assert!(!diff.intersects(&right));
    }

    #[test]
    fn coverage_and_emptiness() {
        let mut mask = BinaryMask::new(10, 10);
        assert!(mask.is_empty());
        mask.set(3, 3, true);
        mask.set(4, 3, true);
        assert!(!mask.is_empty());
        assert!((mask.coverage() - 0.02).abs() < 1e-12);
    }
}
