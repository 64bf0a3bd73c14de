// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalization.

use image::{GrayImage, Luma};
use rayon::prelude::*;

use super::filter::Border;

/// CLAHE over a `tiles x tiles` grid.
///
/// Each tile gets its own equalization table built from a histogram whose
/// bins are clipped at `max(1, clip_limit * tile_area / 256)`; the clipped
/// excess is spread evenly across all bins. Output pixels interpolate
/// bilinearly between the tables of the four nearest tile centres. When the
/// image does not divide evenly the grid is laid over a reflected extension.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let tiles = tiles.max(1);
    let tile_w = w.div_ceil(tiles).max(1);
    let tile_h = h.div_ceil(tiles).max(1);
    let tile_area = (tile_w * tile_h) as usize;
    let clip = ((clip_limit * tile_area as f32 / 256.0) as usize).max(1);

    let sample = |x: u32, y: u32| -> u8 {
        let sx = Border::Reflect101.fold(x as i64, w as i64) as u32;
        let sy = Border::Reflect101.fold(y as i64, h as i64) as u32;
        gray.get_pixel(sx, sy).0[0]
    };

    let luts: Vec<[u8; 256]> = (0..tiles * tiles)
        .into_par_iter()
        .map(|t| {
            let (tx, ty) = (t % tiles, t / tiles);
            let mut hist = [0usize; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    hist[sample(x, y) as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);
            equalization_table(&hist, tile_area)
        })
        .collect();

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let last = tiles as i64 - 1;
    GrayImage::from_fn(w, h, |x, y| {
        let txf = x as f32 * inv_tw - 0.5;
        let tyf = y as f32 * inv_th - 0.5;
        let tx1 = txf.floor() as i64;
        let ty1 = tyf.floor() as i64;
        let xa = txf - tx1 as f32;
        let ya = tyf - ty1 as f32;
        let (tx1c, tx2c) = (tx1.clamp(0, last) as u32, (tx1 + 1).clamp(0, last) as u32);
        let (ty1c, ty2c) = (ty1.clamp(0, last) as u32, (ty1 + 1).clamp(0, last) as u32);

        let v = gray.get_pixel(x, y).0[0] as usize;
        let lut = |tx: u32, ty: u32| luts[(ty * tiles + tx) as usize][v] as f32;
        let top = lut(tx1c, ty1c) * (1.0 - xa) + lut(tx2c, ty1c) * xa;
        let bottom = lut(tx1c, ty2c) * (1.0 - xa) + lut(tx2c, ty2c) * xa;
        Luma([(top * (1.0 - ya) + bottom * ya).round().clamp(0.0, 255.0) as u8])
    })
}

fn clip_histogram(hist: &mut [usize; 256], clip: usize) {
    let mut excess = 0usize;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let batch = excess / 256;
    let residual = excess - batch * 256;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }
}

fn equalization_table(hist: &[usize; 256], area: usize) -> [u8; 256] {
    let scale = 255.0 / area as f32;
    let mut table = [0u8; 256];
    let mut sum = 0usize;
    for (i, &count) in hist.iter().enumerate() {
        sum += count;
        table[i] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    table
}
