use crate::coords::{CELL_COUNT, CellPos};

/// Upper bound of the per-cell wetness accumulator.
pub const MAX_WETNESS: u8 = 20;

/// Per-cell wetness, clamped to `0..=MAX_WETNESS`.
///
/// Values only change additively through [`WetnessMap::add`]; there is no
/// direct setter.
#[derive(Debug, Clone)]
pub struct WetnessMap {
    cells: Vec<u8>,
}

impl Default for WetnessMap {
    fn default() -> Self {
        Self::new()
    }
}

impl WetnessMap {
    /// A completely dry map.
    pub fn new() -> Self {
        Self {
            cells: vec![0; CELL_COUNT],
        }
    }

    /// Add `amount` (which may be negative) to a cell, clamping the result.
    /// Out-of-range coordinates are ignored.
    pub fn add(&mut self, layer: i32, x: i32, y: i32, amount: i32) {
        if let Some(pos) = CellPos::new(layer, x, y) {
            self.add_at(pos, amount);
        }
    }

    /// [`WetnessMap::add`] for a validated position.
    pub fn add_at(&mut self, pos: CellPos, amount: i32) {
        let cell = &mut self.cells[pos.index()];
        *cell = (i32::from(*cell) + amount).clamp(0, i32::from(MAX_WETNESS)) as u8;
    }

    /// Wetness of a cell; out-of-range coordinates read as dry.
    pub fn get(&self, layer: i32, x: i32, y: i32) -> u8 {
        CellPos::new(layer, x, y).map_or(0, |pos| self.at(pos))
    }

    /// Wetness of a validated position.
    pub fn at(&self, pos: CellPos) -> u8 {
        self.cells[pos.index()]
    }

    /// Remove `amount` from every cell. Returns how many cells changed.
    pub fn dry_all(&mut self, amount: u8) -> usize {
        let mut changed = 0;
        for cell in self.cells.iter_mut().filter(|c| **c > 0) {
            *cell = cell.saturating_sub(amount);
            changed += 1;
        }
        changed
    }

    /// Number of cells with any wetness.
    pub fn wet_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c > 0).count()
    }

    /// Sum of wetness across all cells.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| u64::from(*c)).sum()
    }
}
