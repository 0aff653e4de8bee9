//! Flat storage for simulation state.
//!
//! Both buffer kinds are plain row-major `Vec`s so that update kernels can
//! walk them sequentially or split them into rows/chunks for rayon.

/// A fixed-size store of `N` particle records with `F` `f32` fields each.
///
/// The field schema is part of the type, so an update rule written for
/// seven-field records cannot be handed a six-field buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBuffer<const F: usize> {
    records: Vec<[f32; F]>,
}

impl<const F: usize> ParticleBuffer<F> {
    /// Number of fields per record.
    pub const FIELDS: usize = F;

    /// Allocate `count` zero-initialized records.
    pub fn new(count: usize) -> Self {
        Self {
            records: vec![[0.0; F]; count],
        }
    }

    /// Build a buffer from existing records.
    pub fn from_records(records: Vec<[f32; F]>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read one field of one record.
    ///
    /// # Panics
    /// Panics if `index` or `field` is out of range.
    #[inline]
    pub fn read(&self, index: usize, field: usize) -> f32 {
        assert!(field < F, "field {field} out of range for {F}-field records");
        self.records[index][field]
    }

    /// Write one field of one record.
    ///
    /// # Panics
    /// Panics if `index` or `field` is out of range.
    #[inline]
    pub fn write(&mut self, index: usize, field: usize, value: f32) {
        assert!(field < F, "field {field} out of range for {F}-field records");
        self.records[index][field] = value;
    }

    /// Borrow a whole record.
    #[inline]
    pub fn record(&self, index: usize) -> &[f32; F] {
        &self.records[index]
    }

    /// Mutably borrow a whole record.
    #[inline]
    pub fn record_mut(&mut self, index: usize) -> &mut [f32; F] {
        &mut self.records[index]
    }

    /// All records in order.
    #[inline]
    pub fn records(&self) -> &[[f32; F]] {
        &self.records
    }

    /// All records, mutable.
    #[inline]
    pub fn records_mut(&mut self) -> &mut [[f32; F]] {
        &mut self.records
    }

    /// Address of the backing storage.
    ///
    /// Stable for the lifetime of the buffer; used to observe identity swaps.
    pub fn as_ptr(&self) -> *const f32 {
        self.records.as_ptr().cast()
    }
}

/// A `width × height` grid of scalar values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBuffer {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl FieldBuffer {
    /// Allocate a zero-initialized grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Allocate a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Grid width (number of columns).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height (number of rows).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert (x, y) coordinates to linear index.
    ///
    /// # Panics
    /// Panics if the coordinates lie outside the grid.
    #[inline(always)]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }

    /// Value at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    /// Set the value at (x, y).
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }

    /// Row-major view of all cells.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major view of all cells.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// One row of the grid.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&mut self, factor: f32) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    /// Whether the other grid has the same dimensions.
    pub fn same_shape(&self, other: &FieldBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Address of the backing storage.
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_buffer_zeroed() {
        let buf = ParticleBuffer::<6>::new(10);
        assert_eq!(buf.len(), 10);
        assert_eq!(ParticleBuffer::<6>::FIELDS, 6);
        assert!(buf.records().iter().all(|r| r.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_particle_read_write() {
        let mut buf = ParticleBuffer::<4>::new(3);
        buf.write(2, 3, -1.5);
        assert_eq!(buf.read(2, 3), -1.5);
        assert_eq!(buf.record(2), &[0.0, 0.0, 0.0, -1.5]);

        buf.record_mut(0)[1] = 7.0;
        assert_eq!(buf.read(0, 1), 7.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_particle_field_out_of_range() {
        let buf = ParticleBuffer::<4>::new(3);
        buf.read(0, 4);
    }

    #[test]
    #[should_panic]
    fn test_particle_index_out_of_range() {
        let mut buf = ParticleBuffer::<4>::new(3);
        buf.write(3, 0, 1.0);
    }

    #[test]
    fn test_field_buffer_layout() {
        let mut field = FieldBuffer::new(4, 3);
        assert_eq!(field.len(), 12);

        field.set(2, 1, 0.5);
        // Cell (2, 1) is at index 1*4 + 2 = 6
        assert_eq!(field.as_slice()[6], 0.5);
        assert_eq!(field.get(2, 1), 0.5);
        assert_eq!(field.row(1), &[0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    #[should_panic(expected = "outside 4x3 grid")]
    fn test_field_out_of_range() {
        let field = FieldBuffer::new(4, 3);
        field.get(4, 0);
    }

    #[test]
    fn test_field_scale_and_fill() {
        let mut field = FieldBuffer::filled(2, 2, 2.0);
        field.scale(0.5);
        assert!(field.as_slice().iter().all(|&v| v == 1.0));

        field.fill(0.0);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));
    }
}
