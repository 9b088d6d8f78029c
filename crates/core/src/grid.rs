//! Grid module - fixed-size cell store
//!
//! A grid is `width x height` cells, each empty or holding a [`CellValue`].
//! Storage is a flat row-major array so row shifts are in-place slice copies
//! and no row is ever shared between two positions.
//! Coordinates: (x, y) where x grows to the right and y grows downward, row 0
//! is the top of the board.
//!
//! Reads and writes through `get`/`set`/`clear` must be in bounds; an
//! out-of-bounds coordinate there is a caller bug and panics. Collision checks
//! go through [`Grid::is_occupied`], which treats off-board cells as occupied.

use crate::types::{Cell, CellValue};

/// Fixed-size 2D cell store with no game semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u8,
    height: u8,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// Dimensions are validated by the engine configuration; a zero dimension
    /// here is a programmer error.
    pub fn new(width: u8, height: u8) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Check whether (x, y) lies on the board
    #[inline(always)]
    pub fn in_bounds(&self, x: i8, y: i8) -> bool {
        x >= 0 && y >= 0 && (x as u8) < self.width && (y as u8) < self.height
    }

    #[inline(always)]
    fn index(&self, x: i8, y: i8) -> usize {
        assert!(
            self.in_bounds(x, y),
            "grid access out of bounds: ({}, {}) on {}x{}",
            x,
            y,
            self.width,
            self.height
        );
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Get the occupant at (x, y)
    pub fn get(&self, x: i8, y: i8) -> Option<CellValue> {
        self.cells[self.index(x, y)]
    }

    /// Place an occupant at (x, y)
    pub fn set(&mut self, x: i8, y: i8, value: CellValue) {
        let idx = self.index(x, y);
        self.cells[idx] = Some(value);
    }

    /// Empty the cell at (x, y)
    pub fn clear(&mut self, x: i8, y: i8) {
        let idx = self.index(x, y);
        self.cells[idx] = None;
    }

    /// True if (x, y) is filled or off the board.
    ///
    /// Off-board counts as occupied so a single check covers walls, floor and
    /// stacked cells.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.cells[self.index(x, y)].is_some()
    }

    fn row(&self, y: usize) -> &[Cell] {
        let w = self.width as usize;
        &self.cells[y * w..(y + 1) * w]
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height as usize && self.row(y).iter().all(Option::is_some)
    }

    /// Check if a row holds at least one occupant
    pub fn row_has_occupant(&self, y: usize) -> bool {
        y < self.height as usize && self.row(y).iter().any(Option::is_some)
    }

    /// Move every row above `from_row` down by one and empty row 0.
    ///
    /// Row `from_row` itself is overwritten by the row above it.
    pub fn shift_rows_down(&mut self, from_row: usize) {
        assert!(
            from_row < self.height as usize,
            "shift_rows_down: row {} out of bounds",
            from_row
        );
        let w = self.width as usize;
        for row in (1..=from_row).rev() {
            // copy_within handles the overlapping ranges
            self.cells.copy_within((row - 1) * w..row * w, row * w);
        }
        self.cells[..w].fill(None);
    }

    /// Remove every full row in one pass and compact the rows above.
    ///
    /// Two-pointer scan from the bottom: surviving rows are copied down to the
    /// write cursor, and the rows left over at the top are emptied. Returns the
    /// number of rows removed; zero leaves the grid untouched.
    pub fn clear_full_rows(&mut self) -> usize {
        let w = self.width as usize;
        let mut write_y = self.height as usize;
        let mut cleared = 0;

        for read_y in (0..self.height as usize).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
            } else {
                write_y -= 1;
                if write_y != read_y {
                    self.cells
                        .copy_within(read_y * w..(read_y + 1) * w, write_y * w);
                }
            }
        }

        self.cells[..write_y * w].fill(None);
        cleared
    }

    /// Row-major view of all cells (for renderers)
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate over occupied cells as `(x, y, value)`
    pub fn occupied(&self) -> impl Iterator<Item = (i8, i8, CellValue)> + '_ {
        let w = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.map(|v| ((i % w) as i8, (i / w) as i8, v))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Empty the entire grid
    pub fn reset(&mut self) {
        self.cells.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeId;

    const T: CellValue = CellValue::Shape(ShapeId::T);

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(10, 20);
        assert_eq!(grid.cells().len(), 200);
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(grid.get(9, 19), None);
    }

    #[test]
    fn test_set_get_clear() {
        let mut grid = Grid::new(10, 20);
        grid.set(5, 10, T);
        assert_eq!(grid.get(5, 10), Some(T));
        assert_eq!(grid.cells()[10 * 10 + 5], Some(T));
        grid.clear(5, 10);
        assert_eq!(grid.get(5, 10), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics() {
        let grid = Grid::new(10, 20);
        grid.get(10, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_negative_panics() {
        let mut grid = Grid::new(10, 20);
        grid.set(0, -1, T);
    }

    #[test]
    fn test_is_occupied_off_board() {
        let mut grid = Grid::new(10, 20);
        assert!(grid.is_occupied(-1, 0));
        assert!(grid.is_occupied(10, 0));
        assert!(grid.is_occupied(0, 20));
        assert!(grid.is_occupied(0, -1));
        assert!(!grid.is_occupied(0, 0));
        grid.set(0, 0, T);
        assert!(grid.is_occupied(0, 0));
    }

    #[test]
    fn test_shift_rows_down() {
        let mut grid = Grid::new(4, 4);
        grid.set(0, 0, T);
        grid.set(1, 1, T);
        grid.set(2, 2, T);
        grid.set(3, 3, T);

        grid.shift_rows_down(2);

        // row 0 emptied, rows 0..=1 moved to 1..=2, row 3 untouched
        assert!(!grid.row_has_occupant(0));
        assert_eq!(grid.get(0, 1), Some(T));
        assert_eq!(grid.get(1, 2), Some(T));
        assert_eq!(grid.get(2, 2), None);
        assert_eq!(grid.get(3, 3), Some(T));
    }

    #[test]
    fn test_clear_full_rows_non_adjacent() {
        let mut grid = Grid::new(3, 5);
        for x in 0..3 {
            grid.set(x, 4, T);
            grid.set(x, 2, T);
        }
        grid.set(1, 3, T);
        grid.set(0, 1, T);

        assert_eq!(grid.clear_full_rows(), 2);

        assert_eq!(grid.get(1, 4), Some(T));
        assert_eq!(grid.get(0, 3), Some(T));
        assert_eq!(grid.occupied_count(), 2);
        assert!(!grid.row_has_occupant(0));
        assert!(!grid.row_has_occupant(1));
        assert!(!grid.row_has_occupant(2));
    }

    #[test]
    fn test_clear_no_full_rows_is_noop() {
        let mut grid = Grid::new(10, 20);
        grid.set(3, 19, T);
        grid.set(4, 7, T);
        let before = grid.clone();
        assert_eq!(grid.clear_full_rows(), 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_occupied_iter() {
        let mut grid = Grid::new(10, 20);
        grid.set(2, 3, T);
        let cells: Vec<_> = grid.occupied().collect();
        assert_eq!(cells, vec![(2, 3, T)]);
    }
}
