// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary morphology with rectangular structuring elements.
//
// Odd square elements go through `imageproc::morphology` (the L∞ ball of
// radius n/2 is exactly an n×n square). Even elements have no centre pixel,
// so they are applied as separable min/max with the anchor at (w/2, h/2).
// In both cases pixels outside the image are ignored.

use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::mask::BinaryMask;

/// Rectangular structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub width: u32,
    pub height: u32,
}

impl Kernel {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    fn odd_square_radius(self) -> Option<u8> {
        if self.width == self.height && self.width % 2 == 1 && self.width / 2 <= u8::MAX as u32 {
            Some((self.width / 2) as u8)
        } else {
            None
        }
    }

    /// Offsets covered along one axis of length `len`, relative to the anchor.
    fn span(len: u32) -> (i64, i64) {
        let anchor = (len / 2) as i64;
        (-anchor, len as i64 - 1 - anchor)
    }
}

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

pub fn dilate(mask: &BinaryMask, kernel: Kernel, iterations: u32) -> BinaryMask {
    repeat(mask, kernel, iterations, Op::Dilate)
}

pub fn erode(mask: &BinaryMask, kernel: Kernel, iterations: u32) -> BinaryMask {
    repeat(mask, kernel, iterations, Op::Erode)
}

/// Dilate then erode: fills gaps and pinholes smaller than the element.
pub fn close(mask: &BinaryMask, kernel: Kernel) -> BinaryMask {
    erode(&dilate(mask, kernel, 1), kernel, 1)
}

/// Erode then dilate: removes specks smaller than the element.
pub fn open(mask: &BinaryMask, kernel: Kernel) -> BinaryMask {
    dilate(&erode(mask, kernel, 1), kernel, 1)
}

fn repeat(mask: &BinaryMask, kernel: Kernel, iterations: u32, op: Op) -> BinaryMask {
    let mut current = mask.clone();
    if kernel.width <= 1 && kernel.height <= 1 {
        return current;
    }
    for _ in 0..iterations {
        current = apply(&current, kernel, op);
    }
    current
}

fn apply(mask: &BinaryMask, kernel: Kernel, op: Op) -> BinaryMask {
    if let Some(radius) = kernel.odd_square_radius() {
        let gray = match op {
            Op::Dilate => morphology::dilate(mask.as_gray(), Norm::LInf, radius),
            Op::Erode => morphology::erode(mask.as_gray(), Norm::LInf, radius),
        };
        return BinaryMask::from_gray_nonzero(&gray);
    }
    let horizontal = pass(mask, Kernel::span(kernel.width), true, op);
    pass(&horizontal, Kernel::span(kernel.height), false, op)
}

/// One separable pass along x (`along_x`) or y.
fn pass(mask: &BinaryMask, (lo, hi): (i64, i64), along_x: bool, op: Op) -> BinaryMask {
    let (w, h) = mask.dimensions();
    let len = if along_x { w } else { h } as i64;
    BinaryMask::from_fn(w, h, |x, y| {
        let pos = if along_x { x } else { y } as i64;
        let start = (pos + lo).max(0);
        let end = (pos + hi).min(len - 1);
        let mut taps = (start..=end).map(|p| {
            let p = p as u32;
            if along_x {
                mask.is_set(p, y)
            } else {
                mask.is_set(x, p)
            }
        });
        match op {
            Op::Dilate => taps.any(|v| v),
            Op::Erode => taps.all(|v| v),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(w: u32, h: u32, x: u32, y: u32) -> BinaryMask {
        BinaryMask::from_fn(w, h, |px, py| px == x && py == y)
    }

    #[test]
    fn odd_square_dilation_grows_a_point_into_a_square() {
        let out = dilate(&single(11, 11, 5, 5), Kernel::square(3), 1);
        assert_eq!(out.count_set(), 9);
        let twice = dilate(&single(11, 11, 5, 5), Kernel::square(3), 2);
        assert_eq!(twice.count_set(), 25);
    }

    #[test]
    fn even_kernel_anchor_is_at_half_width() {
        // 2x2 element anchored at (1,1) covers offsets {-1, 0} on each axis,
        // so dilation spreads towards +x/+y.
        let out = dilate(&single(6, 6, 2, 2), Kernel::square(2), 1);
        assert_eq!(out.count_set(), 4);
        assert!(out.is_set(2, 2));
        assert!(out.is_set(3, 3));
        assert!(!out.is_set(1, 1));
    }

    #[test]
    fn erosion_ignores_out_of_bounds() {
        let full = BinaryMask::from_fn(5, 5, |_, _| true);
        assert_eq!(erode(&full, Kernel::square(3), 1).count_set(), 25);
        assert_eq!(erode(&full, Kernel::square(2), 1).count_set(), 25);
    }

    #[test]
    fn erosion_removes_thin_strokes() {
        let line = BinaryMask::from_fn(10, 10, |_, y| y == 4);
        assert!(erode(&line, Kernel::square(3), 1).is_empty());
    }

    #[test]
    fn close_fills_a_pinhole() {
        let mut mask = BinaryMask::from_fn(9, 9, |x, y| (2..7).contains(&x) && (2..7).contains(&y));
        mask.set(4, 4, false);
        let closed = close(&mask, Kernel::square(3));
        assert!(closed.is_set(4, 4));
    }

    #[test]
    fn open_removes_a_speck() {
        let mut mask = BinaryMask::from_fn(12, 12, |x, y| (5..10).contains(&x) && (5..10).contains(&y));
        mask.set(1, 1, true);
        let opened = open(&mask, Kernel::square(3));
        assert!(!opened.is_set(1, 1));
        assert!(opened.is_set(7, 7));
    }
}
