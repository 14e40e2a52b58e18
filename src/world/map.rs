//! The tile grid a level is made of.
//!
//! A map is a flat byte grid; `0` is open floor, anything else is an opaque
//! wall tile whose value doubles as the texture index. The DDA in
//! `render::walls` never bounds-checks its cell lookups, so the outer ring
//! of every map **must** be solid; that invariant is enforced here, once,
//! at construction, and nowhere on the frame path.

use thiserror::Error;

/// Cell value meaning "walkable, nothing to draw".
pub const EMPTY_TILE: u8 = 0;

/// Hard upper bound on either map dimension. Chosen so that a `PackFix4`
/// can address any cell and so `1 / NEAR_ZERO` rays always leave the grid
/// before their accumulator saturates.
pub const MAX_MAP_DIM: u8 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map dimensions {0}x{1} outside 3..={MAX_MAP_DIM}")]
    BadDimensions(u8, u8),

    #[error("cell buffer holds {got} cells, map needs {need}")]
    BadCellCount { got: usize, need: usize },

    #[error("border cell ({0},{1}) is empty; the outer ring must be solid")]
    OpenBorder(u8, u8),
}

/// A validated level grid. Width and height are immutable after
/// construction; cells mutate only through [`Map::set_tile`].
#[derive(Clone, Debug)]
pub struct Map {
    cells: Vec<u8>,
    width: u8,
    height: u8,
}

impl Map {
    /// Validate and take ownership of a cell grid.
    ///
    /// Rejects degenerate dimensions (a bordered map needs at least one
    /// interior cell, hence the minimum of 3) and any hole in the outer
    /// ring.
    pub fn new(cells: Vec<u8>, width: u8, height: u8) -> Result<Self, MapError> {
        if !(3..=MAX_MAP_DIM).contains(&width) || !(3..=MAX_MAP_DIM).contains(&height) {
            return Err(MapError::BadDimensions(width, height));
        }
        let need = width as usize * height as usize;
        if cells.len() != need {
            return Err(MapError::BadCellCount {
                got: cells.len(),
                need,
            });
        }
        let map = Map {
            cells,
            width,
            height,
        };
        for x in 0..width {
            for y in [0, height - 1] {
                if map.tile(x, y) == EMPTY_TILE {
                    return Err(MapError::OpenBorder(x, y));
                }
            }
        }
        for y in 0..height {
            for x in [0, width - 1] {
                if map.tile(x, y) == EMPTY_TILE {
                    return Err(MapError::OpenBorder(x, y));
                }
            }
        }
        Ok(map)
    }

    /// Square map filled with `border` on the ring and `interior` inside.
    pub fn bordered(dim: u8, border: u8, interior: u8) -> Result<Self, MapError> {
        if border == EMPTY_TILE {
            return Err(MapError::OpenBorder(0, 0));
        }
        let mut cells = vec![interior; dim as usize * dim as usize];
        for i in 0..dim as usize {
            cells[i] = border; // y = 0 row
            cells[(dim as usize - 1) * dim as usize + i] = border; // top row
            cells[i * dim as usize] = border; // x = 0 column
            cells[i * dim as usize + dim as usize - 1] = border;
        }
        Map::new(cells, dim, dim)
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    fn index(&self, x: u8, y: u8) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Cell lookup. `x`/`y` are caller-guaranteed in bounds; this is the
    /// DDA's inner-loop read.
    #[inline]
    pub fn tile(&self, x: u8, y: u8) -> u8 {
        self.cells[self.index(x, y)]
    }

    /// Overwrite one cell. Clearing a border cell would break the DDA
    /// termination contract, hence the debug check.
    #[inline]
    pub fn set_tile(&mut self, x: u8, y: u8, tile: u8) {
        debug_assert!(
            tile != EMPTY_TILE
                || (x > 0 && y > 0 && x < self.width - 1 && y < self.height - 1),
            "clearing border cell ({x},{y})"
        );
        let i = self.index(x, y);
        self.cells[i] = tile;
    }

    /// Overwrite every cell, border included, with one tile. An empty tile
    /// would open the border, hence the debug check; use
    /// [`Map::fill_interior`] to clear the floor.
    pub fn fill(&mut self, tile: u8) {
        debug_assert!(tile != EMPTY_TILE, "filling the whole map with floor");
        self.cells.fill(tile);
    }

    /// Fill everything inside the border ring with one tile.
    pub fn fill_interior(&mut self, tile: u8) {
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                let i = self.index(x, y);
                self.cells[i] = tile;
            }
        }
    }

    /// True when the cell blocks movement; the default solidity policy.
    /// Callers with richer tile semantics pass their own predicate to
    /// `Camera::move_and_rotate` instead.
    #[inline]
    pub fn is_solid(&self, x: u8, y: u8) -> bool {
        self.tile(x, y) != EMPTY_TILE
    }

    /// Plot the grid as single pixels with north up, for an overhead view.
    /// Slow, debug-quality; not part of the frame path.
    pub fn draw_overhead(&self, fb: &mut crate::render::Framebuffer, ox: u32, oy: u32) {
        for i in 0..self.height {
            for j in 0..self.width {
                let lit = self.tile(j, self.height - i - 1) != EMPTY_TILE;
                fb.set_pixel(ox + j as u32, oy + i as u32, lit);
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_map_validates() {
        let map = Map::bordered(8, 1, EMPTY_TILE).unwrap();
        assert_eq!(map.tile(0, 0), 1);
        assert_eq!(map.tile(7, 7), 1);
        assert_eq!(map.tile(3, 3), EMPTY_TILE);
    }

    #[test]
    fn open_border_rejected() {
        let mut cells = vec![1u8; 25];
        cells[2] = EMPTY_TILE; // hole at (2, 0)
        assert_eq!(
            Map::new(cells, 5, 5).unwrap_err(),
            MapError::OpenBorder(2, 0)
        );
    }

    #[test]
    fn wrong_cell_count_rejected() {
        assert_eq!(
            Map::new(vec![1; 10], 4, 4).unwrap_err(),
            MapError::BadCellCount { got: 10, need: 16 }
        );
    }

    #[test]
    fn degenerate_dimensions_rejected() {
        assert!(matches!(
            Map::new(vec![1; 4], 2, 2),
            Err(MapError::BadDimensions(2, 2))
        ));
        assert!(matches!(
            Map::new(vec![1; 17 * 17], 17, 17),
            Err(MapError::BadDimensions(17, 17))
        ));
    }

    #[test]
    fn set_and_fill() {
        let mut map = Map::bordered(6, 2, EMPTY_TILE).unwrap();
        map.set_tile(2, 3, 7);
        assert_eq!(map.tile(2, 3), 7);
        map.fill_interior(4);
        assert_eq!(map.tile(2, 3), 4);
        assert_eq!(map.tile(0, 0), 2); // border untouched
        map.fill(5);
        assert_eq!(map.tile(2, 3), 5);
        assert_eq!(map.tile(0, 0), 5); // border overwritten too
    }
}
