//! Grid layout.
//!
//! [`layout`] is a pure function from the container size, the
//! [`GridConfig`] and the ordered list of bound surfaces to one [`Rect`] per
//! surface.  Slots are placed in row-major order; a dimension of `0` means
//! "as many as needed".
//!
//! When both dimensions are fixed and there are more surfaces than cells,
//! the row count grows to fit so that every surface still lands inside the
//! container.

use crate::command::SurfaceId;

/// A rectangle in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The window every child is embedded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container {
    pub id: SurfaceId,
    pub width: u32,
    pub height: u32,
}

/// Row/column counts and the full-mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridConfig {
    /// Number of rows, `0` for unconstrained.
    pub rows: u32,
    /// Number of columns, `0` for unconstrained.
    pub cols: u32,
    /// Every surface gets the whole container.
    pub full: bool,
}

impl GridConfig {
    pub fn new(rows: u32, cols: u32, full: bool) -> Self {
        Self { rows, cols, full }
    }

    pub fn toggle_full(&mut self) {
        self.full = !self.full;
    }

    /// Row count actually used for `count` surfaces.
    fn effective_rows(&self, count: usize) -> u32 {
        let (rows, cols) = (self.rows as usize, self.cols as usize);
        if rows > 0 && cols > 0 && rows * cols < count {
            count.div_ceil(cols) as u32
        } else {
            self.rows
        }
    }
}

/// Compute the rectangle of every surface in `surfaces`.
///
/// The output has exactly one entry per input surface, in the same order.
pub fn layout(
    container: &Container,
    config: &GridConfig,
    surfaces: &[SurfaceId],
) -> Vec<(SurfaceId, Rect)> {
    if config.full {
        let whole = Rect::new(0, 0, container.width, container.height);
        return surfaces.iter().map(|&s| (s, whole)).collect();
    }

    let rows = config.effective_rows(surfaces.len());
    let cols = config.cols;
    let cell_width = if cols > 0 {
        container.width / cols
    } else {
        container.width
    };
    let cell_height = if rows > 0 {
        container.height / rows
    } else {
        container.height
    };

    surfaces
        .iter()
        .enumerate()
        .map(|(i, &surface)| {
            let i = i as u32;
            let (row, col) = if cols > 0 { (i / cols, i % cols) } else { (0, i) };
            let rect = Rect::new(
                (col * cell_width) as i32,
                (row * cell_height) as i32,
                cell_width,
                cell_height,
            );
            (surface, rect)
        })
        .collect()
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    const A: SurfaceId = 0xa;
    const B: SurfaceId = 0xb;
    const C: SurfaceId = 0xc;
    const D: SurfaceId = 0xd;

    fn container(width: u32, height: u32) -> Container {
        Container {
            id: 1,
            width,
            height,
        }
    }

    #[test]
    fn two_by_two_quadrants() {
        let out = layout(&container(800, 600), &GridConfig::new(2, 2, false), &[A, B, C, D]);
        assert_eq!(
            out,
            vec![
                (A, Rect::new(0, 0, 400, 300)),
                (B, Rect::new(400, 0, 400, 300)),
                (C, Rect::new(0, 300, 400, 300)),
                (D, Rect::new(400, 300, 400, 300)),
            ]
        );
    }

    #[test]
    fn full_mode_gives_everyone_the_container() {
        let out = layout(&container(800, 600), &GridConfig::new(2, 2, true), &[A, B, C, D]);
        assert_eq!(out.len(), 4);
        for (_, rect) in out {
            assert_eq!(rect, Rect::new(0, 0, 800, 600));
        }
    }

    #[test]
    fn unbounded_rows_with_two_columns() {
        let out = layout(&container(800, 300), &GridConfig::new(0, 2, false), &[A, B, C]);
        assert_eq!(
            out,
            vec![
                (A, Rect::new(0, 0, 400, 300)),
                (B, Rect::new(400, 0, 400, 300)),
                (C, Rect::new(0, 300, 400, 300)),
            ]
        );
    }

    #[test]
    fn unconstrained_grid_is_a_single_row_of_full_cells() {
        let out = layout(&container(640, 480), &GridConfig::default(), &[A, B]);
        assert_eq!(
            out,
            vec![(A, Rect::new(0, 0, 640, 480)), (B, Rect::new(640, 0, 640, 480))]
        );
    }

    #[test]
    fn fixed_rows_without_columns_stay_in_first_row() {
        let out = layout(&container(600, 600), &GridConfig::new(3, 0, false), &[A, B]);
        assert_eq!(
            out,
            vec![(A, Rect::new(0, 0, 600, 200)), (B, Rect::new(600, 0, 600, 200))]
        );
    }

    #[test]
    fn overflow_grows_rows_to_fit() {
        // 1x2 grid holding three surfaces: two rows of 300 px.
        let out = layout(&container(800, 600), &GridConfig::new(1, 2, false), &[A, B, C]);
        assert_eq!(
            out,
            vec![
                (A, Rect::new(0, 0, 400, 300)),
                (B, Rect::new(400, 0, 400, 300)),
                (C, Rect::new(0, 300, 400, 300)),
            ]
        );
        for (_, r) in &out {
            assert!(r.y as u32 + r.height <= 600);
        }
    }

    #[test]
    fn underfull_grid_keeps_configured_cell_size() {
        let out = layout(&container(900, 600), &GridConfig::new(2, 3, false), &[A]);
        assert_eq!(out, vec![(A, Rect::new(0, 0, 300, 300))]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(layout(&container(800, 600), &GridConfig::new(2, 2, false), &[]).is_empty());
        assert!(layout(&container(800, 600), &GridConfig::new(0, 0, true), &[]).is_empty());
    }

    #[test]
    fn toggle_full_flips() {
        let mut cfg = GridConfig::new(2, 2, false);
        cfg.toggle_full();
        assert!(cfg.full);
        cfg.toggle_full();
        assert!(!cfg.full);
    }

    #[test]
    fn more_columns_than_pixels_collapses_to_zero_width() {
        let tiny = Container {
            id: 1,
            width: 10,
            height: 10,
        };
        let placed = layout(&tiny, &GridConfig::new(1, 20, false), &[1, 2]);
        assert_eq!(
            placed,
            vec![(1, Rect::new(0, 0, 0, 10)), (2, Rect::new(0, 0, 0, 10))]
        );
    }
}
