//! 2D wave propagation on a height field.
//!
//! Uses the forward-time centered-space (FTCS) discretization of the wave
//! equation:
//!
//! next = scale * (N + W + E + S - 4*C) + 2*C - prev
//!
//! Only interior cells are computed; the one-cell border of the output is
//! never written. Three buffers cycle prev ← current ← next every frame.

use physim_core::prelude::*;
use rand::Rng;
use serde::Deserialize;
#[cfg(feature = "simd")]
use std::ops::Range;

/// Parameters for the wave demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveParams {
    /// Per-cell propagation factor `(c*dt/dx)²`, uniform over the grid.
    pub scale: f32,
    /// Number of random drops seeded at startup (besides the center drop).
    pub drops: usize,
    /// Height given to each drop.
    pub drop_height: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            scale: 0.3,
            drops: 1000,
            drop_height: 1.0,
        }
    }
}

impl WaveParams {
    /// Set the propagation factor.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the number of random drops.
    pub fn with_drops(mut self, drops: usize) -> Self {
        self.drops = drops;
        self
    }

    /// Check the 2D FTCS stability bound `scale <= 1/2`.
    pub fn is_stable(&self) -> bool {
        self.scale <= 0.5
    }
}

/// The FTCS stencil over three fields.
///
/// Must only be evaluated on the interior of the grid.
pub struct WaveStencil<'a> {
    prev: &'a FieldBuffer,
    curr: &'a FieldBuffer,
    scale: &'a FieldBuffer,
}

impl<'a> WaveStencil<'a> {
    /// Bind the stencil to its inputs.
    ///
    /// # Panics
    /// Panics if the three fields differ in size.
    pub fn new(prev: &'a FieldBuffer, curr: &'a FieldBuffer, scale: &'a FieldBuffer) -> Self {
        assert!(
            prev.same_shape(curr) && curr.same_shape(scale),
            "wave stencil inputs differ in size"
        );
        Self { prev, curr, scale }
    }
}

impl FieldRule for WaveStencil<'_> {
    #[inline]
    fn eval(&self, x: usize, y: usize) -> f32 {
        let c = self.curr.get(x, y);
        let laplacian = self.curr.get(x, y - 1)
            + self.curr.get(x - 1, y)
            + self.curr.get(x + 1, y)
            + self.curr.get(x, y + 1)
            - 4.0 * c;
        self.scale.get(x, y) * laplacian + 2.0 * c - self.prev.get(x, y)
    }

    /// SIMD implementation for a run of interior cells, 8 at a time.
    #[cfg(feature = "simd")]
    fn eval_row(&self, y: usize, cols: Range<usize>, out: &mut [f32]) {
        use std::simd::f32x8;

        let width = self.curr.width();
        let curr = self.curr.as_slice();
        let prev = self.prev.as_slice();
        let scale = self.scale.as_slice();
        let row_start = y * width;

        let four = f32x8::splat(4.0);
        let two = f32x8::splat(2.0);

        let mut x = cols.start;
        let mut i = 0;
        while x + 8 <= cols.end {
            let idx = row_start + x;

            let c = f32x8::from_slice(&curr[idx..idx + 8]);
            let p = f32x8::from_slice(&prev[idx..idx + 8]);
            let s = f32x8::from_slice(&scale[idx..idx + 8]);
            let north = f32x8::from_slice(&curr[idx - width..idx - width + 8]);
            let south = f32x8::from_slice(&curr[idx + width..idx + width + 8]);
            let west = f32x8::from_slice(&curr[idx - 1..idx - 1 + 8]);
            let east = f32x8::from_slice(&curr[idx + 1..idx + 1 + 8]);

            let laplacian = north + west + east + south - four * c;
            let next = s * laplacian + two * c - p;
            out[i..i + 8].copy_from_slice(&next.to_array());

            x += 8;
            i += 8;
        }

        // Scalar fallback for remaining cells
        while x < cols.end {
            out[i] = self.eval(x, y);
            x += 1;
            i += 1;
        }
    }
}

/// Wave heights over a `width × height` grid.
pub struct WaveSim {
    heights: TripleBuffer<FieldBuffer>,
    scale: FieldBuffer,
    params: WaveParams,
}

impl WaveSim {
    /// Create a quiet grid with a uniform scale field.
    pub fn new(width: usize, height: usize, params: WaveParams) -> Self {
        if !params.is_stable() {
            tracing::warn!(scale = params.scale, "wave scale exceeds the FTCS stability bound");
        }
        Self {
            heights: TripleBuffer::from_initial(FieldBuffer::new(width, height)),
            scale: FieldBuffer::filled(width, height, params.scale),
            params,
        }
    }

    /// Create the demo grid: one drop in the center plus `params.drops`
    /// drops at random cells.
    pub fn seeded<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        params: WaveParams,
        rng: &mut R,
    ) -> Self {
        let mut sim = Self::new(width, height, params);
        if width == 0 || height == 0 {
            return sim;
        }

        let amplitude = sim.params.drop_height;
        sim.drop_at(width / 2, height / 2, amplitude);
        for _ in 0..sim.params.drops {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            sim.drop_at(x, y, amplitude);
        }
        tracing::info!(width, height, drops = sim.params.drops, "wave grid seeded");
        sim
    }

    /// Set the current height of one cell.
    pub fn drop_at(&mut self, x: usize, y: usize, amplitude: f32) {
        self.heights.current_mut().set(x, y, amplitude);
    }

    /// Replace the per-cell scale field.
    ///
    /// # Panics
    /// Panics if `scale` differs in size from the grid.
    pub fn set_scale_field(&mut self, scale: FieldBuffer) {
        assert!(scale.same_shape(&self.scale), "scale field differs in size");
        self.scale = scale;
    }

    /// The latest computed heights.
    pub fn current(&self) -> &FieldBuffer {
        self.heights.current()
    }

    /// The heights one step earlier.
    pub fn previous(&self) -> &FieldBuffer {
        self.heights.prev()
    }

    /// Parameters in use.
    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    /// Sum of squared heights.
    pub fn total_energy(&self) -> f32 {
        self.current().as_slice().iter().map(|h| h * h).sum()
    }

    /// Largest absolute height.
    pub fn max_height(&self) -> f32 {
        self.current().as_slice().iter().map(|h| h.abs()).fold(0.0, f32::max)
    }
}

impl Simulation for WaveSim {
    fn name(&self) -> &'static str {
        "wave"
    }

    fn render(&mut self) -> &FieldBuffer {
        self.heights.current()
    }

    fn step<E: KernelEvaluator>(&mut self, evaluator: &E) {
        let (prev, curr, next) = self.heights.split_mut();
        let region = Region::interior(curr.width(), curr.height());
        evaluator.realize_field(&WaveStencil::new(prev, curr, &self.scale), region, next);
        self.heights.advance();
    }
}
