//! Float-to-pixel conversion and particle rasterization.

use crate::buffer::FieldBuffer;

/// Gray channel multiplier: replicates one byte into R, G and B.
const GRAY: u32 = 0x0001_0101;

/// Smallest and largest value in the field.
///
/// Returns `(0.0, 0.0)` for an empty field.
pub fn min_max(field: &FieldBuffer) -> (f32, f32) {
    let mut values = field.as_slice().iter().copied();
    let Some(first) = values.next() else {
        return (0.0, 0.0);
    };
    values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Rescale a float field into packed `0x00RRGGBB` gray pixels.
///
/// Values are mapped linearly so that `range.0` becomes black and `range.1`
/// white. Without an explicit range the field is scanned for its extremes.
/// A degenerate range (`max <= min`) renders black; values outside the range
/// saturate.
///
/// # Panics
/// Panics if `out` is not exactly one pixel per cell.
pub fn rescale_to_rgb(field: &FieldBuffer, range: Option<(f32, f32)>, out: &mut [u32]) {
    assert_eq!(
        out.len(),
        field.len(),
        "pixel buffer holds {} pixels for {} cells",
        out.len(),
        field.len()
    );

    let (min, max) = range.unwrap_or_else(|| min_max(field));
    if max <= min || !(max - min).is_finite() {
        out.fill(0);
        return;
    }

    let scale = 255.0 / (max - min);
    for (pixel, &v) in out.iter_mut().zip(field.as_slice()) {
        let level = ((v - min) * scale + 0.5).clamp(0.0, 255.0) as u32;
        *pixel = level * GRAY;
    }
}

/// Rasterize particle positions as `value` into `image`.
///
/// Each position is rounded to the nearest cell and clamped to the image, so
/// off-screen particles pile up on the border rather than vanish.
pub fn splat<I>(image: &mut FieldBuffer, positions: I, value: f32)
where
    I: IntoIterator<Item = (f32, f32)>,
{
    if image.is_empty() {
        return;
    }
    let max_x = (image.width() - 1) as f32;
    let max_y = (image.height() - 1) as f32;

    for (x, y) in positions {
        // NaN positions clamp to 0 through the saturating cast
        let px = (x + 0.5).floor().clamp(0.0, max_x) as usize;
        let py = (y + 0.5).floor().clamp(0.0, max_y) as usize;
        image.set(px, py, value);
    }
}

/// Write `fade * previous` into `next`, cell by cell.
///
/// # Panics
/// Panics if the two images differ in size.
pub fn fade_into(previous: &FieldBuffer, next: &mut FieldBuffer, fade: f32) {
    assert!(previous.same_shape(next), "trail images differ in size");
    for (dst, &src) in next.as_mut_slice().iter_mut().zip(previous.as_slice()) {
        *dst = fade * src;
    }
}
