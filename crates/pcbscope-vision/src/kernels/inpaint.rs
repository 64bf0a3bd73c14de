// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fast-marching inpainting (Telea).
//
// Pixels under the mask are filled in order of their arrival time `T` from
// the mask boundary. Each newly reached pixel is a weighted average of the
// known pixels within `radius`, weighted by distance, by level-set closeness
// and by alignment with the marching direction.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{ImageBuffer, Pixel};
use tracing::{debug, warn};

use super::mask::BinaryMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Known,
    Band,
    Inside,
}

const UNREACHED: f32 = 1.0e6;

/// Min-heap entry on arrival time, ties broken by pixel index.
#[derive(Debug, Clone, Copy)]
struct Front {
    t: f32,
    idx: usize,
}

impl PartialEq for Front {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Front {}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Front {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

struct Field {
    w: i64,
    h: i64,
    state: Vec<State>,
    t: Vec<f32>,
}

impl Field {
    #[inline]
    fn idx(&self, x: i64, y: i64) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.w && y < self.h).then(|| (y * self.w + x) as usize)
    }

    #[inline]
    fn known_at(&self, x: i64, y: i64) -> Option<usize> {
        self.idx(x, y).filter(|&i| self.state[i] != State::Inside)
    }

    /// Eikonal update from one horizontal and one vertical neighbour.
    fn solve(&self, (x1, y1): (i64, i64), (x2, y2): (i64, i64)) -> f32 {
        match (self.known_at(x1, y1), self.known_at(x2, y2)) {
            (Some(a), Some(b)) => {
                let (ta, tb) = (self.t[a], self.t[b]);
                let d = ta - tb;
                let radicand = 2.0 - d * d;
                if d.abs() >= 1.0 || radicand < 0.0 {
                    1.0 + ta.min(tb)
                } else {
                    (ta + tb + radicand.sqrt()) * 0.5
                }
            }
            (Some(a), None) => 1.0 + self.t[a],
            (None, Some(b)) => 1.0 + self.t[b],
            (None, None) => UNREACHED,
        }
    }

    fn arrival(&self, x: i64, y: i64) -> f32 {
        [
            self.solve((x - 1, y), (x, y - 1)),
            self.solve((x + 1, y), (x, y - 1)),
            self.solve((x - 1, y), (x, y + 1)),
            self.solve((x + 1, y), (x, y + 1)),
        ]
        .into_iter()
        .fold(UNREACHED, f32::min)
    }

    /// Central (or one-sided) difference of `f` along one axis, using only
    /// non-inside samples.
    fn gradient(&self, x: i64, y: i64, dx: i64, dy: i64, f: impl Fn(usize) -> f32) -> f32 {
        let Some(c) = self.idx(x, y) else { return 0.0 };
        let fwd = self.known_at(x + dx, y + dy);
        let back = self.known_at(x - dx, y - dy);
        match (fwd, back) {
            (Some(p), Some(m)) => (f(p) - f(m)) * 0.5,
            (Some(p), None) => f(p) - f(c),
            (None, Some(m)) => f(c) - f(m),
            (None, None) => 0.0,
        }
    }
}

/// Fill the set pixels of `mask` from their surroundings.
///
/// An empty mask returns the input unchanged. A mask covering every pixel
/// leaves nothing to sample from, so the result is the mean color of the
/// input.
pub fn telea<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    mask: &BinaryMask,
    radius: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = image.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut out = image.clone();

    let masked = mask.count_set();
    if masked == 0 {
        return out;
    }
    if masked == w as u64 * h as u64 {
        warn!("Inpaint mask covers the whole image; filling with the mean color");
        fill_mean(&mut out, channels);
        return out;
    }

    let mut field = Field {
        w: w as i64,
        h: h as i64,
        state: vec![State::Known; (w * h) as usize],
        t: vec![0.0; (w * h) as usize],
    };
    for y in 0..h {
        for x in 0..w {
            if mask.is_set(x, y) {
                let i = (y * w + x) as usize;
                field.state[i] = State::Inside;
                field.t[i] = UNREACHED;
            }
        }
    }

    let mut heap = BinaryHeap::new();
    for y in 0..field.h {
        for x in 0..field.w {
            let i = (y * field.w + x) as usize;
            if field.state[i] != State::Known {
                continue;
            }
            let touches_inside = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .filter_map(|(dx, dy)| field.idx(x + dx, y + dy))
                .any(|n| field.state[n] == State::Inside);
            if touches_inside {
                field.state[i] = State::Band;
                heap.push(Front { t: 0.0, idx: i });
            }
        }
    }

    let radius = radius.max(1) as i64;
    let mut filled = 0u64;
    while let Some(Front { idx, .. }) = heap.pop() {
        field.state[idx] = State::Known;
        let (cx, cy) = ((idx as i64) % field.w, (idx as i64) / field.w);

        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (cx + dx, cy + dy);
            let Some(n) = field.idx(nx, ny) else { continue };
            if field.state[n] != State::Inside {
                continue;
            }
            let t = field.arrival(nx, ny);
            field.t[n] = t;
            paint(&field, &mut out, channels, nx, ny, radius);
            field.state[n] = State::Band;
            heap.push(Front { t, idx: n });
            filled += 1;
        }
    }

    debug!(filled, masked, radius, "Telea inpaint complete");
    out
}

fn paint<P>(
    field: &Field,
    out: &mut ImageBuffer<P, Vec<u8>>,
    channels: usize,
    x: i64,
    y: i64,
    radius: i64,
) where
    P: Pixel<Subpixel = u8>,
{
    let ti = |i: usize| field.t[i];
    let grad_tx = field.gradient(x, y, 1, 0, ti);
    let grad_ty = field.gradient(x, y, 0, 1, ti);
    let t_here = field.t[(y * field.w + x) as usize];

    let row = field.w as usize * channels;
    let mut ia = vec![0f32; channels];
    let mut jx = vec![0f32; channels];
    let mut jy = vec![0f32; channels];
    let mut total = 0f32;

    for ky in (y - radius).max(0)..=(y + radius).min(field.h - 1) {
        for kx in (x - radius).max(0)..=(x + radius).min(field.w - 1) {
            let (rx, ry) = ((x - kx) as f32, (y - ky) as f32);
            let r2 = rx * rx + ry * ry;
            if r2 == 0.0 || r2 > (radius * radius) as f32 {
                continue;
            }
            let Some(k) = field.known_at(kx, ky) else { continue };

            let dst = 1.0 / (r2 * r2.sqrt());
            let lev = 1.0 / (1.0 + (field.t[k] - t_here).abs());
            let mut dir = rx * grad_tx + ry * grad_ty;
            if dir.abs() <= 0.01 {
                dir = 1.0e-6;
            }
            let weight = (dst * lev * dir).abs();

            let raw = out.as_raw();
            for c in 0..channels {
                let sample = |i: usize| raw[i * channels + c] as f32;
                let gx = field.gradient(kx, ky, 1, 0, sample);
                let gy = field.gradient(kx, ky, 0, 1, sample);
                ia[c] += weight * raw[ky as usize * row + kx as usize * channels + c] as f32;
                jx[c] -= weight * gx * rx;
                jy[c] -= weight * gy * ry;
            }
            total += weight;
        }
    }

    if total <= 0.0 {
        return;
    }
    let base = y as usize * row + x as usize * channels;
    let buf: &mut [u8] = out;
    for c in 0..channels {
        let norm = (jx[c] * jx[c] + jy[c] * jy[c]).sqrt() + 1.0e-20;
        let value = ia[c] / total + (jx[c] + jy[c]) / norm + 0.5;
        buf[base + c] = value.clamp(0.0, 255.0) as u8;
    }
}

fn fill_mean<P>(image: &mut ImageBuffer<P, Vec<u8>>, channels: usize)
where
    P: Pixel<Subpixel = u8>,
{
    let buf: &mut [u8] = image;
    let pixels = (buf.len() / channels).max(1) as u64;
    let mut sums = vec![0u64; channels];
    for px in buf.chunks_exact(channels) {
        for (s, &v) in sums.iter_mut().zip(px) {
            *s += v as u64;
        }
    }
    let mean: Vec<u8> = sums
        .iter()
        .map(|s| ((*s as f64 / pixels as f64).round()) as u8)
        .collect();
    for px in buf.chunks_exact_mut(channels) {
        px.copy_from_slice(&mean);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn empty_mask_is_identity() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 7]));
        let out = telea(&img, &BinaryMask::new(8, 8), 3);
        assert_eq!(out, img);
    }

    #[test]
    fn hole_in_flat_region_takes_surrounding_value() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([40, 160, 90]));
        let mask = BinaryMask::from_fn(20, 20, |x, y| (8..12).contains(&x) && (8..12).contains(&y));
        for y in 8..12 {
            for x in 8..12 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let out = telea(&img, &mask, 5);
        for y in 8..12 {
            for x in 8..12 {
                let p = out.get_pixel(x, y).0;
                assert!(p[0].abs_diff(40) <= 2, "{p:?} at ({x},{y})");
                assert!(p[1].abs_diff(160) <= 2, "{p:?} at ({x},{y})");
                assert!(p[2].abs_diff(90) <= 2, "{p:?} at ({x},{y})");
            }
        }
        // Pixels outside the mask are untouched.
        assert_eq!(out.get_pixel(0, 0), &Rgb([40, 160, 90]));
    }

    #[test]
    fn fill_blends_between_two_sides() {
        // Left half dark, right half light, a vertical band masked between.
        let mut img = GrayImage::from_fn(30, 10, |x, _| Luma([if x < 15 { 50 } else { 200 }]));
        let mask = BinaryMask::from_fn(30, 10, |x, _| (13..17).contains(&x));
        for y in 0..10 {
            for x in 13..17 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let out = telea(&img, &mask, 3);
        let left = out.get_pixel(13, 5).0[0];
        let right = out.get_pixel(16, 5).0[0];
        assert!(left < right, "left {left} right {right}");
        assert!((40..=210).contains(&left));
    }

    #[test]
    fn full_mask_fills_with_mean() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 10 } else { 30 }]));
        let out = telea(&img, &BinaryMask::from_fn(2, 1, |_, _| true), 3);
        assert_eq!(out.as_raw(), &vec![20, 20]);
    }

    #[test]
    fn heap_orders_by_arrival_time() {
        let mut heap = BinaryHeap::new();
        heap.push(Front { t: 2.0, idx: 0 });
        heap.push(Front { t: 0.5, idx: 9 });
        heap.push(Front { t: 0.5, idx: 3 });
        assert_eq!(heap.pop().map(|f| f.idx), Some(3));
        assert_eq!(heap.pop().map(|f| f.idx), Some(9));
        assert_eq!(heap.pop().map(|f| f.idx), Some(0));
    }
}
