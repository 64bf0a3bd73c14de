// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kernels module — the pixel-level primitives both analysis branches build on.

pub mod clahe;
pub mod color;
pub mod filter;
pub mod inpaint;
pub mod mask;
pub mod morphology;
pub mod threshold;

pub use mask::BinaryMask;
pub use morphology::Kernel;
pub use threshold::Polarity;
