// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Smoothing filters with explicit kernel sizes and border handling.
//
// `imageproc::filter::gaussian_blur_f32` derives its kernel extent from sigma,
// which is fine for the unsharp mask. The thresholding and compositing stages
// are tuned against a fixed kernel side, so they use the sized variant here.

use image::{GrayImage, ImageBuffer, Luma, Pixel};
use imageproc::filter::gaussian_blur_f32;
use rayon::prelude::*;

/// How out-of-range taps are folded back into the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `gfedcb|abcdefgh|gfedcba` (the edge pixel is not repeated).
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
}

impl Border {
    #[inline]
    pub(crate) fn fold(self, i: i64, n: i64) -> usize {
        if n <= 1 {
            return 0;
        }
        match self {
            Border::Replicate => i.clamp(0, n - 1) as usize,
            Border::Reflect101 => {
                let mut i = i;
                while i < 0 || i >= n {
                    if i < 0 {
                        i = -i;
                    }
                    if i >= n {
                        i = 2 * n - 2 - i;
                    }
                }
                i as usize
            }
        }
    }
}

/// Sigma implied by a kernel side when none is given explicitly.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian taps of length `ksize`.
///
/// A non-positive `sigma` is replaced by [`sigma_for_kernel`].
pub fn gaussian_kernel(ksize: u32, sigma: f32) -> Vec<f32> {
    let ksize = ksize.max(1);
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_kernel(ksize)
    };
    let half = (ksize as f32 - 1.0) * 0.5;
    let mut taps: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

/// Separable Gaussian blur with a fixed `ksize x ksize` kernel.
///
/// Works for any 8-bit pixel layout (gray or RGB). Each channel is filtered
/// independently and rounded to nearest.
pub fn gaussian_blur_sized<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    ksize: u32,
    border: Border,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = image.dimensions();
    if ksize <= 1 || w == 0 || h == 0 {
        return image.clone();
    }
    let taps = gaussian_kernel(ksize, 0.0);
    let half = (ksize / 2) as i64;
    let channels = P::CHANNEL_COUNT as usize;
    let src = image.as_raw();
    let row_len = w as usize * channels;

    // Horizontal pass into f32.
    let mut tmp = vec![0f32; src.len()];
    tmp.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * row_len..(y + 1) * row_len];
        for x in 0..w as i64 {
            for c in 0..channels {
                let mut acc = 0f32;
                for (k, &t) in taps.iter().enumerate() {
                    let sx = border.fold(x + k as i64 - half, w as i64);
                    acc += t * src_row[sx * channels + c] as f32;
                }
                row[x as usize * channels + c] = acc;
            }
        }
    });

    // Vertical pass back to u8.
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        for (i, dst) in row.iter_mut().enumerate() {
            let mut acc = 0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sy = border.fold(y as i64 + k as i64 - half, h as i64);
                acc += t * tmp[sy * row_len + i];
            }
            *dst = acc.round().clamp(0.0, 255.0) as u8;
        }
    });

    // Length is preserved from the source buffer.
    ImageBuffer::from_raw(w, h, out).unwrap_or_else(|| image.clone())
}

/// Edge-preserving bilateral filter over a grayscale image.
///
/// The window is the disc of radius `diameter / 2`. Each neighbour is weighted
/// by `exp(-r²/2σs²) * exp(-Δ²/2σc²)` where `r` is its spatial distance and
/// `Δ` its intensity difference from the centre.
pub fn bilateral(gray: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let radius = (diameter / 2).max(1) as i64;

    // Precompute the spatial window and the 256-entry color table.
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let mut window: Vec<(i64, i64, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() > radius as f32 {
                continue;
            }
            window.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let color_weight: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let src = gray.as_raw();
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(w as usize).enumerate().for_each(|(y, row)| {
        for (x, dst) in row.iter_mut().enumerate() {
            let center = src[y * w as usize + x] as i32;
            let mut sum = 0f32;
            let mut norm = 0f32;
            for &(dx, dy, ws) in &window {
                let sx = Border::Reflect101.fold(x as i64 + dx, w as i64);
                let sy = Border::Reflect101.fold(y as i64 + dy, h as i64);
                let v = src[sy * w as usize + sx] as i32;
                let wt = ws * color_weight[(v - center).unsigned_abs() as usize];
                sum += wt * v as f32;
                norm += wt;
            }
            *dst = (sum / norm).round().clamp(0.0, 255.0) as u8;
        }
    });

    GrayImage::from_raw(w, h, out).unwrap_or_else(|| gray.clone())
}

/// Unsharp mask: `amount * img - (amount - 1) * gaussian(img, sigma)`.
pub fn unsharp(gray: &GrayImage, sigma: f32, amount: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0] as f32;
        let b = blurred.get_pixel(x, y).0[0] as f32;
        Luma([(amount * v - (amount - 1.0) * b).round().clamp(0.0, 255.0) as u8])
    })
}
