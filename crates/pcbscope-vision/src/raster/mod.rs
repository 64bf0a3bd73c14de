// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — input decoding/normalization and boundary encoding.

pub mod processor;

pub use processor::{
    BoardImage, encode_jpeg_gray, encode_jpeg_rgb, encode_png_gray, jpeg_data_uri, to_base64,
};
