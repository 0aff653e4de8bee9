//! Kernel evaluation over whole buffers.
//!
//! An update rule describes how to compute a single output element from the
//! read-only input state. A [`KernelEvaluator`] decides how to apply it to
//! every element of an output buffer: one after another, or spread over the
//! rayon thread pool. Rules never see the output buffer, so no element can
//! observe another element's result from the same step.

use crate::buffer::{FieldBuffer, ParticleBuffer};
use rayon::prelude::*;
use std::ops::Range;

/// A rectangular sub-region of a field, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// First column.
    pub x: usize,
    /// First row.
    pub y: usize,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl Region {
    /// The whole `width × height` grid.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// The grid minus a one-cell border on every side.
    ///
    /// Empty when the grid is narrower or shorter than three cells.
    pub fn interior(width: usize, height: usize) -> Self {
        Self {
            x: 1,
            y: 1,
            width: width.saturating_sub(2),
            height: height.saturating_sub(2),
        }
    }

    /// Whether the region covers no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of cells covered.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Column range.
    #[inline]
    pub fn cols(&self) -> Range<usize> {
        self.x..self.x + self.width
    }

    /// Row range.
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.y..self.y + self.height
    }

    /// Whether (x, y) lies inside the region.
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.cols().contains(&x) && self.rows().contains(&y)
    }

    fn assert_within(&self, field: &FieldBuffer) {
        assert!(
            self.x + self.width <= field.width() && self.y + self.height <= field.height(),
            "region {:?} exceeds {}x{} output",
            self,
            field.width(),
            field.height()
        );
    }
}

/// Per-cell update rule for a 2D field.
///
/// Implementors capture their input buffers by reference; `eval` must be a
/// pure function of those inputs and the coordinates.
pub trait FieldRule: Sync {
    /// Compute the next value of cell (x, y).
    fn eval(&self, x: usize, y: usize) -> f32;

    /// Compute a contiguous run of cells in row `y`.
    ///
    /// `out[i]` receives the value of column `cols.start + i`. Rules with a
    /// vectorized row kernel override this.
    fn eval_row(&self, y: usize, cols: Range<usize>, out: &mut [f32]) {
        for (slot, x) in out.iter_mut().zip(cols) {
            *slot = self.eval(x, y);
        }
    }
}

/// Per-record update rule for a particle buffer with `F` fields.
pub trait ParticleRule<const F: usize>: Sync {
    /// Number of records in the input snapshot.
    fn len(&self) -> usize;

    /// Compute the next state of record `index`.
    fn eval(&self, index: usize) -> [f32; F];
}

/// Applies update rules to every element of an output buffer.
pub trait KernelEvaluator {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Evaluate `rule` for every cell of `region`, writing into `output`.
    ///
    /// Cells outside the region are left untouched.
    ///
    /// # Panics
    /// Panics if the region does not fit inside `output`.
    fn realize_field<R: FieldRule>(&self, rule: &R, region: Region, output: &mut FieldBuffer);

    /// Evaluate `rule` for every record, writing into `output`.
    ///
    /// # Panics
    /// Panics if the rule's input and `output` hold different record counts.
    fn realize_particles<const F: usize, R: ParticleRule<F>>(
        &self,
        rule: &R,
        output: &mut ParticleBuffer<F>,
    );
}

fn assert_same_count<const F: usize, R: ParticleRule<F>>(rule: &R, output: &ParticleBuffer<F>) {
    assert_eq!(
        rule.len(),
        output.len(),
        "rule input has {} records but output has {}",
        rule.len(),
        output.len()
    );
}

/// Evaluates elements one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialEvaluator;

impl KernelEvaluator for SequentialEvaluator {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn realize_field<R: FieldRule>(&self, rule: &R, region: Region, output: &mut FieldBuffer) {
        if region.is_empty() {
            return;
        }
        region.assert_within(output);

        let width = output.width();
        let cols = region.cols();
        let data = output.as_mut_slice();
        for y in region.rows() {
            let row = &mut data[y * width..(y + 1) * width];
            rule.eval_row(y, cols.clone(), &mut row[cols.clone()]);
        }
    }

    fn realize_particles<const F: usize, R: ParticleRule<F>>(
        &self,
        rule: &R,
        output: &mut ParticleBuffer<F>,
    ) {
        assert_same_count(rule, output);
        for (i, record) in output.records_mut().iter_mut().enumerate() {
            *record = rule.eval(i);
        }
    }
}

/// Evaluates elements on the rayon thread pool.
///
/// Fields are split by rows, particle buffers by records. `min_len` bounds
/// how finely particle work is split. Workloads smaller than
/// `sequential_below` elements run on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct ParallelEvaluator {
    min_len: usize,
    sequential_below: usize,
}

impl Default for ParallelEvaluator {
    fn default() -> Self {
        Self {
            min_len: 64,
            sequential_below: PARALLEL_THRESHOLD,
        }
    }
}

/// Element count below which parallel dispatch costs more than it saves.
pub const PARALLEL_THRESHOLD: usize = 512;

impl ParallelEvaluator {
    /// Create an evaluator with the default split granularity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum number of particle records per parallel task.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(1);
        self
    }

    /// Run workloads of fewer than `elements` on the calling thread.
    pub fn with_sequential_below(mut self, elements: usize) -> Self {
        self.sequential_below = elements;
        self
    }
}

impl KernelEvaluator for ParallelEvaluator {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn realize_field<R: FieldRule>(&self, rule: &R, region: Region, output: &mut FieldBuffer) {
        if region.is_empty() {
            return;
        }
        if region.area() < self.sequential_below {
            return SequentialEvaluator.realize_field(rule, region, output);
        }
        region.assert_within(output);

        let width = output.width();
        let cols = region.cols();

        // Each row is processed independently in parallel
        output
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .skip(region.y)
            .take(region.height)
            .for_each(|(y, row)| {
                rule.eval_row(y, cols.clone(), &mut row[cols.clone()]);
            });
    }

    fn realize_particles<const F: usize, R: ParticleRule<F>>(
        &self,
        rule: &R,
        output: &mut ParticleBuffer<F>,
    ) {
        if output.len() < self.sequential_below {
            return SequentialEvaluator.realize_particles(rule, output);
        }
        assert_same_count(rule, output);
        output
            .records_mut()
            .par_iter_mut()
            .with_min_len(self.min_len)
            .enumerate()
            .for_each(|(i, record)| *record = rule.eval(i));
    }
}

/// Runtime choice between the CPU evaluators.
#[derive(Debug, Clone, Copy)]
pub enum CpuEvaluator {
    /// Single-threaded evaluation.
    Sequential(SequentialEvaluator),
    /// rayon data-parallel evaluation.
    Parallel(ParallelEvaluator),
}

impl Default for CpuEvaluator {
    fn default() -> Self {
        Self::Parallel(ParallelEvaluator::default())
    }
}

impl CpuEvaluator {
    /// Pick the sequential or parallel evaluator.
    pub fn new(parallel: bool) -> Self {
        if parallel {
            Self::default()
        } else {
            Self::Sequential(SequentialEvaluator)
        }
    }
}

impl KernelEvaluator for CpuEvaluator {
    fn name(&self) -> &'static str {
        match self {
            Self::Sequential(e) => e.name(),
            Self::Parallel(e) => e.name(),
        }
    }

    fn realize_field<R: FieldRule>(&self, rule: &R, region: Region, output: &mut FieldBuffer) {
        match self {
            Self::Sequential(e) => e.realize_field(rule, region, output),
            Self::Parallel(e) => e.realize_field(rule, region, output),
        }
    }

    fn realize_particles<const F: usize, R: ParticleRule<F>>(
        &self,
        rule: &R,
        output: &mut ParticleBuffer<F>,
    ) {
        match self {
            Self::Sequential(e) => e.realize_particles(rule, output),
            Self::Parallel(e) => e.realize_particles(rule, output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a value derived from the coordinates.
    struct Coords;

    impl FieldRule for Coords {
        fn eval(&self, x: usize, y: usize) -> f32 {
            (y * 100 + x) as f32
        }
    }

    /// Doubles every field of the input record.
    struct Doubler<'a> {
        input: &'a ParticleBuffer<2>,
    }

    impl ParticleRule<2> for Doubler<'_> {
        fn len(&self) -> usize {
            self.input.len()
        }

        fn eval(&self, index: usize) -> [f32; 2] {
            let [a, b] = *self.input.record(index);
            [2.0 * a, 2.0 * b]
        }
    }

    #[test]
    fn test_region_interior() {
        let region = Region::interior(8, 6);
        assert_eq!(
            region,
            Region {
                x: 1,
                y: 1,
                width: 6,
                height: 4
            }
        );
        assert!(region.contains(1, 1));
        assert!(region.contains(6, 4));
        assert!(!region.contains(0, 3));
        assert!(!region.contains(7, 3));
        assert!(Region::interior(2, 10).is_empty());
    }

    #[test]
    fn test_region_write_leaves_border() {
        let parallel = ParallelEvaluator::new().with_sequential_below(0);
        for evaluator in [CpuEvaluator::new(false), CpuEvaluator::Parallel(parallel)] {
            let mut out = FieldBuffer::filled(5, 4, -1.0);
            evaluator.realize_field(&Coords, Region::interior(5, 4), &mut out);

            for y in 0..4 {
                for x in 0..5 {
                    let expected = if Region::interior(5, 4).contains(x, y) {
                        (y * 100 + x) as f32
                    } else {
                        -1.0
                    };
                    assert_eq!(out.get(x, y), expected, "{} at ({x}, {y})", evaluator.name());
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records = (0..1000).map(|i| [i as f32, -(i as f32)]).collect();
        let input = ParticleBuffer::from_records(records);
        let mut seq = ParticleBuffer::new(1000);
        let mut par = ParticleBuffer::new(1000);

        let rule = Doubler { input: &input };
        SequentialEvaluator.realize_particles(&rule, &mut seq);
        ParallelEvaluator::new().with_min_len(16).realize_particles(&rule, &mut par);

        assert_eq!(seq, par);
        assert_eq!(seq.record(999), &[1998.0, -1998.0]);
    }

    #[test]
    fn test_small_workload_stays_on_caller() {
        let input = ParticleBuffer::from_records(vec![[1.0, 2.0]; 8]);
        let mut out = ParticleBuffer::new(8);
        let caller = std::thread::current().id();

        struct OnThread<'a>(Doubler<'a>, std::thread::ThreadId);
        impl ParticleRule<2> for OnThread<'_> {
            fn len(&self) -> usize {
                self.0.len()
            }

            fn eval(&self, index: usize) -> [f32; 2] {
                assert_eq!(std::thread::current().id(), self.1);
                self.0.eval(index)
            }
        }

        let rule = OnThread(Doubler { input: &input }, caller);
        ParallelEvaluator::new().realize_particles(&rule, &mut out);
        assert_eq!(out.record(7), &[2.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "records but output has")]
    fn test_record_count_mismatch() {
        let input = ParticleBuffer::<2>::new(4);
        let mut out = ParticleBuffer::<2>::new(5);
        SequentialEvaluator.realize_particles(&Doubler { input: &input }, &mut out);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_region_outside_output() {
        let mut out = FieldBuffer::new(4, 4);
        let region = Region {
            x: 2,
            y: 0,
            width: 3,
            height: 1,
        };
        SequentialEvaluator.realize_field(&Coords, region, &mut out);
    }
}
