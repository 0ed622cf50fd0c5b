use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of vertical world slices.
pub const LAYER_COUNT: usize = 6;
/// Cells along the x axis of every layer.
pub const GRID_WIDTH: usize = 50;
/// Cells along the y axis of every layer.
pub const GRID_HEIGHT: usize = 50;
/// Stacked geometry slots per cell (floor, furniture, overhang).
pub const MAX_HEIGHT_LEVELS: usize = 3;
/// The surface layer: rain wetness and grass sway are sampled here.
pub const GROUND_LAYER: usize = 1;
/// Width of a tile sprite in screen pixels.
pub const TILE_WIDTH: i32 = 64;
/// Height of a tile sprite in screen pixels.
pub const TILE_HEIGHT: i32 = 32;

/// Total number of cells across all layers.
pub const CELL_COUNT: usize = LAYER_COUNT * GRID_WIDTH * GRID_HEIGHT;

/// A validated, in-bounds cell coordinate.
///
/// Construct one from untrusted signed coordinates with [`CellPos::new`];
/// every method that takes a `CellPos` can index without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// Vertical layer, `0..LAYER_COUNT`.
    pub layer: usize,
    /// Column, `0..GRID_WIDTH`.
    pub x: usize,
    /// Row, `0..GRID_HEIGHT`.
    pub y: usize,
}

impl CellPos {
    /// Returns `None` when any coordinate falls outside the grid.
    pub fn new(layer: i32, x: i32, y: i32) -> Option<Self> {
        let layer = usize::try_from(layer).ok()?;
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (layer < LAYER_COUNT && x < GRID_WIDTH && y < GRID_HEIGHT).then_some(Self { layer, x, y })
    }

    /// Flat index into dense per-cell storage.
    pub fn index(self) -> usize {
        (self.layer * GRID_WIDTH + self.x) * GRID_HEIGHT + self.y
    }

    /// The in-bounds orthogonal neighbours within the same layer.
    pub fn neighbors4(self) -> impl Iterator<Item = CellPos> {
        const OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
        OFFSETS.into_iter().filter_map(move |(dx, dy)| {
            CellPos::new(self.layer as i32, self.x as i32 + dx, self.y as i32 + dy)
        })
    }

    /// Every cell of one layer, x-major.
    pub fn iter_layer(layer: usize) -> impl Iterator<Item = CellPos> {
        (0..GRID_WIDTH).flat_map(move |x| (0..GRID_HEIGHT).map(move |y| CellPos { layer, x, y }))
    }

    /// Every cell of every layer.
    pub fn iter_all() -> impl Iterator<Item = CellPos> {
        (0..LAYER_COUNT).flat_map(Self::iter_layer)
    }

    /// Screen-space position of this cell's floor.
    pub fn screen(self) -> ScreenPoint {
        project(self.x as i32, self.y as i32, 0)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}({}, {})", self.layer, self.x, self.y)
    }
}

/// A point in unscrolled isometric screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal pixel offset.
    pub x: f32,
    /// Vertical pixel offset.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a point from pixel offsets.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by a pixel offset.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Isometric projection of grid coordinates, raised by `height` half-tiles.
pub fn project(x: i32, y: i32, height: i32) -> ScreenPoint {
    let half_w = TILE_WIDTH / 2;
    let half_h = TILE_HEIGHT / 2;
    ScreenPoint::new(
        ((x - y) * half_w) as f32,
        ((x + y) * half_h - height * half_h) as f32,
    )
}
