//! Per-pixel collision masks.

/// Rectangular bitmap of opaque pixels used for exact overlap tests.
///
/// Pixels are addressed as `(x, y)` with the origin in the top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl CollisionMask {
    /// Builds a mask by asking `opaque` about every pixel.
    #[must_use]
    pub fn from_fn<F>(width: u32, height: u32, mut opaque: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(opaque(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    /// Fully opaque rectangle.
    #[must_use]
    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Disc of the provided radius inscribed in a `2r x 2r` square.
    ///
    /// A pixel is opaque when its center lies within the radius.
    #[must_use]
    pub fn disc(radius: u32) -> Self {
        let diameter = radius * 2;
        let radius = radius as f32;
        Self::from_fn(diameter, diameter, |x, y| {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            dx * dx + dy * dy <= radius * radius
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` is opaque. Pixels outside the mask are not.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Number of opaque pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    /// First opaque pixel shared with `other` placed at `offset` relative to this mask.
    ///
    /// The scan runs row by row over the intersection of both rectangles, so
    /// the reported point is the top-most, then left-most, collision.
    #[must_use]
    pub fn overlap(&self, other: &CollisionMask, offset: (i64, i64)) -> Option<(i64, i64)> {
        let (dx, dy) = offset;
        let left = dx.max(0);
        let top = dy.max(0);
        let right = (dx + i64::from(other.width)).min(i64::from(self.width));
        let bottom = (dy + i64::from(other.height)).min(i64::from(self.height));

        for y in top..bottom {
            for x in left..right {
                if self.get(x, y) && other.get(x - dx, y - dy) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Reports whether any opaque pixels coincide.
    #[must_use]
    pub fn overlaps(&self, other: &CollisionMask, offset: (i64, i64)) -> bool {
        self.overlap(other, offset).is_some()
    }
}
