// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trace mask synthesis from the preprocessed candidates.

use pcbscope_core::config::TraceConfig;
use tracing::{debug, instrument};

use crate::kernels::morphology::{close, dilate, erode};
use crate::kernels::{BinaryMask, Kernel};

#[derive(Debug, Clone)]
pub struct SynthesizedTraces {
    /// Union, bridged, trimmed and closed; still overlaps components.
    pub enhanced: BinaryMask,
    /// `enhanced AND NOT components`.
    pub traces: BinaryMask,
}

#[derive(Debug, Clone)]
pub struct TraceSynthesizer {
    bridge: Kernel,
    bridge_iterations: u32,
    trim: Kernel,
    trim_iterations: u32,
    close: Kernel,
}

impl TraceSynthesizer {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            bridge: Kernel::square(config.bridge_dilate_kernel),
            bridge_iterations: config.bridge_dilate_iterations,
            trim: Kernel::square(config.trim_erode_kernel),
            trim_iterations: config.trim_erode_iterations,
            close: Kernel::square(config.close_kernel),
        }
    }

    #[instrument(skip_all, fields(width = adaptive.width(), height = adaptive.height()))]
    pub fn synthesize(
        &self,
        adaptive: &BinaryMask,
        otsu: &BinaryMask,
        edges: &BinaryMask,
        components: &BinaryMask,
    ) -> SynthesizedTraces {
        let candidates = adaptive.union(otsu).union(edges);
        let bridged = dilate(&candidates, self.bridge, self.bridge_iterations);
        let trimmed = erode(&bridged, self.trim, self.trim_iterations);
        let enhanced = close(&trimmed, self.close);
        let traces = enhanced.and_not(components);
        debug!(
            candidates = candidates.count_set(),
            enhanced = enhanced.count_set(),
            traces = traces.count_set(),
            "Trace mask synthesized"
        );
        SynthesizedTraces { enhanced, traces }
    }
}

impl Default for TraceSynthesizer {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}
