use ndarray::Array2;

/// Morphological opening (erosion followed by dilation) with a 3x3 square
/// structuring element. Strips hot pixels and thin noise bridges from a
/// disc mask while leaving the disc itself intact.
pub fn morphological_opening(mask: &Array2<bool>) -> Array2<bool> {
    dilate(&erode(mask))
}

/// A pixel survives erosion only if its whole 3x3 neighbourhood is set.
/// Pixels outside the image count as unset.
pub fn erode(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        mask[[row, col]] && window(h, w, row, col).all(|(r, c)| mask[[r, c]]) && !on_edge(h, w, row, col)
    })
}

/// A pixel is set after dilation if any pixel of its 3x3 neighbourhood is set.
pub fn dilate(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        window(h, w, row, col).any(|(r, c)| mask[[r, c]])
    })
}

fn on_edge(h: usize, w: usize, row: usize, col: usize) -> bool {
    row == 0 || col == 0 || row + 1 == h || col + 1 == w
}

/// In-bounds coordinates of the 3x3 window centred on `(row, col)`.
fn window(h: usize, w: usize, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    let rows = row.saturating_sub(1)..=(row + 1).min(h - 1);
    rows.flat_map(move |r| {
        let cols = col.saturating_sub(1)..=(col + 1).min(w - 1);
        cols.map(move |c| (r, c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_removes_isolated_pixel() {
        let mut mask = Array2::from_elem((9, 9), false);
        mask[[4, 4]] = true;
        assert!(!morphological_opening(&mask).iter().any(|&v| v));
    }

    #[test]
    fn opening_keeps_solid_block() {
        let mut mask = Array2::from_elem((9, 9), false);
        for r in 2..7 {
            for c in 2..7 {
                mask[[r, c]] = true;
            }
        }
        let opened = morphological_opening(&mask);
        assert_eq!(opened, mask);
    }
}
