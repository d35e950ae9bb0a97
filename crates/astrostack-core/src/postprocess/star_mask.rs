/// Binary raster marking pixels to be inpainted.
///
/// Has the dimensions of the frame it overlays. Inpainting unmarks pixels
/// as it fills them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl StarMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_masked(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.width + x] = true;
    }

    pub fn clear(&mut self, x: usize, y: usize) {
        self.bits[y * self.width + x] = false;
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Mark every pixel whose centre lies within `radius` of `(cx, cy)`.
    pub fn paint_disc(&mut self, cx: f64, cy: f64, radius: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let r2 = radius * radius;
        let row_lo = (cy - radius).floor().max(0.0) as usize;
        let row_hi = ((cy + radius).ceil().max(0.0) as usize).min(self.height - 1);
        let col_lo = (cx - radius).floor().max(0.0) as usize;
        let col_hi = ((cx + radius).ceil().max(0.0) as usize).min(self.width - 1);
        for y in row_lo..=row_hi {
            for x in col_lo..=col_hi {
                let (dx, dy) = (x as f64 - cx, y as f64 - cy);
                if dx * dx + dy * dy <= r2 {
                    self.set(x, y);
                }
            }
        }
    }

    /// Coordinates `(x, y)` of all marked pixels, in scan order.
    pub fn masked_pixels(&self) -> Vec<(usize, usize)> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_is_clipped_at_edges() {
        let mut mask = StarMask::new(5, 5);
        mask.paint_disc(0.0, 0.0, 1.0);
        assert_eq!(mask.count(), 3);
        assert!(mask.is_masked(0, 0) && mask.is_masked(1, 0) && mask.is_masked(0, 1));
    }
}
