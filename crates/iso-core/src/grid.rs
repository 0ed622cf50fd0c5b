use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::coords::{CELL_COUNT, CellPos, LAYER_COUNT, MAX_HEIGHT_LEVELS};
use crate::tile::{HeightLevel, Tile, TileCatalog};

/// Interned tile id. Cheap to copy and store per height slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey(u32);

/// The height slots of one cell. `None` means empty.
type Cell = [Option<TileKey>; MAX_HEIGHT_LEVELS];

/// A resolved reference from a grid slot to its catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct TileRef<'a> {
    /// The id stored in the grid.
    pub id: &'a str,
    /// The catalog definition.
    pub tile: &'a Tile,
}

/// Per-layer, per-cell, per-height-level occupancy map.
///
/// Storage is one flat `Vec` of fixed-size cells, so nothing allocates per
/// cell. Writes outside the grid are dropped silently and reads outside the
/// grid return nothing.
#[derive(Debug, Clone)]
pub struct TileGrid {
    catalog: Arc<TileCatalog>,
    cells: Vec<Cell>,
    names: Vec<String>,
    keys: HashMap<String, TileKey>,
}

impl TileGrid {
    /// An empty grid backed by the given catalog.
    pub fn new(catalog: Arc<TileCatalog>) -> Self {
        Self {
            catalog,
            cells: vec![[None; MAX_HEIGHT_LEVELS]; CELL_COUNT],
            names: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// The catalog this grid resolves ids against.
    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    /// A shared handle to the catalog.
    pub fn catalog_handle(&self) -> Arc<TileCatalog> {
        Arc::clone(&self.catalog)
    }

    fn intern(&mut self, id: &str) -> TileKey {
        if let Some(key) = self.keys.get(id) {
            return *key;
        }
        let key = TileKey(self.names.len() as u32);
        self.names.push(id.to_string());
        self.keys.insert(id.to_string(), key);
        key
    }

    fn name(&self, key: TileKey) -> &str {
        &self.names[key.0 as usize]
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Write a tile reference. Returns `false` (and changes nothing) when any
    /// coordinate or the height level is out of range.
    pub fn place(&mut self, layer: i32, x: i32, y: i32, height_level: i32, tile_id: &str) -> bool {
        let (Some(pos), Ok(level)) = (CellPos::new(layer, x, y), usize::try_from(height_level)) else {
            trace!(layer, x, y, height_level, "placement out of bounds dropped");
            return false;
        };
        self.place_at(pos, level, tile_id)
    }

    /// Write a tile reference at a validated position.
    pub fn place_at(&mut self, pos: CellPos, height_level: usize, tile_id: &str) -> bool {
        if height_level >= MAX_HEIGHT_LEVELS {
            return false;
        }
        let key = self.intern(tile_id);
        self.cells[pos.index()][height_level] = Some(key);
        true
    }

    /// Empty one height slot.
    pub fn clear_at(&mut self, pos: CellPos, height_level: usize) {
        if let Some(slot) = self.cells[pos.index()].get_mut(height_level) {
            *slot = None;
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The raw id stored in a slot, whether or not the catalog knows it.
    pub fn tile_id_at(&self, layer: i32, x: i32, y: i32, height_level: i32) -> Option<&str> {
        let pos = CellPos::new(layer, x, y)?;
        self.id_at(pos, usize::try_from(height_level).ok()?)
    }

    /// The raw id stored in a slot of a validated position.
    pub fn id_at(&self, pos: CellPos, height_level: usize) -> Option<&str> {
        let key = (*self.cells[pos.index()].get(height_level)?)?;
        Some(self.name(key))
    }

    /// Resolve a slot against the catalog.
    ///
    /// Empty slots, out-of-range coordinates and ids the catalog does not
    /// know all yield `None`; the unknown-id case also logs a one-time warning.
    pub fn tile_at(&self, layer: i32, x: i32, y: i32, height_level: i32) -> Option<TileRef<'_>> {
        let pos = CellPos::new(layer, x, y)?;
        self.tile_at_pos(pos, usize::try_from(height_level).ok()?)
    }

    /// [`TileGrid::tile_at`] for a validated position.
    pub fn tile_at_pos(&self, pos: CellPos, height_level: usize) -> Option<TileRef<'_>> {
        let id = self.id_at(pos, height_level)?;
        match self.catalog.get(id) {
            Some(tile) => Some(TileRef { id, tile }),
            None => {
                self.catalog.warn_missing(id);
                None
            }
        }
    }

    /// Geometry of an occupied slot.
    ///
    /// An unknown id, or a tile without geometry at this height level,
    /// degrades to the fallback tile's floor instead of failing.
    pub fn level_at(&self, pos: CellPos, height_level: usize) -> Option<(&Tile, &HeightLevel)> {
        let id = self.id_at(pos, height_level)?;
        let tile = self.catalog.resolve(id);
        match tile.level(height_level) {
            Some(level) => Some((tile, level)),
            None => {
                let fallback = self.catalog.fallback();
                fallback.height_levels.first().map(|level| (fallback, level))
            }
        }
    }

    /// The floor tile (height level 0) of a cell.
    pub fn floor(&self, pos: CellPos) -> Option<&Tile> {
        self.tile_at_pos(pos, 0).map(|r| r.tile)
    }

    /// Occupied slots of a cell as `(height_level, id)`.
    pub fn column(&self, pos: CellPos) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.cells[pos.index()]
            .iter()
            .enumerate()
            .filter_map(|(level, key)| key.map(|k| (level, self.name(k))))
    }

    /// Every occupied slot of a layer as `(pos, height_level, id)`.
    pub fn occupied(&self, layer: usize) -> impl Iterator<Item = (CellPos, usize, &str)> + '_ {
        let layers = if layer < LAYER_COUNT { layer..layer + 1 } else { 0..0 };
        layers
            .flat_map(CellPos::iter_layer)
            .flat_map(move |pos| self.column(pos).map(move |(level, id)| (pos, level, id)))
    }

    /// Number of occupied slots across the whole grid.
    pub fn placement_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| cell.iter().filter(|slot| slot.is_some()).count())
            .sum()
    }

    // -----------------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------------

    /// Whether an actor of `actor_height` may enter `(x, y)`.
    ///
    /// Within one layer, any occupied slot that is impassable and at least as
    /// tall as the actor blocks. Across layers, the source cell's floor must
    /// be a bridge that lists the destination layer.
    pub fn can_traverse(&self, from_layer: i32, to_layer: i32, x: i32, y: i32, actor_height: i32) -> bool {
        if from_layer != to_layer {
            return self.has_connection(from_layer, to_layer, x, y);
        }
        let Some(pos) = CellPos::new(to_layer, x, y) else {
            return false;
        };
        (0..MAX_HEIGHT_LEVELS).all(|h| match self.level_at(pos, h) {
            Some((_, level)) => level.passable || actor_height > level.height,
            None => true,
        })
    }

    /// Whether the floor at `(from_layer, x, y)` is a bridge reaching `to_layer`.
    pub fn has_connection(&self, from_layer: i32, to_layer: i32, x: i32, y: i32) -> bool {
        let Some(pos) = CellPos::new(from_layer, x, y) else {
            return false;
        };
        let Ok(to) = usize::try_from(to_layer) else {
            return false;
        };
        to < LAYER_COUNT && self.floor(pos).is_some_and(|tile| tile.connects_to(to))
    }

    /// Whether the floor at a cell can carry furniture.
    pub fn supports_furniture(&self, layer: i32, x: i32, y: i32) -> bool {
        CellPos::new(layer, x, y)
            .and_then(|pos| self.floor(pos))
            .is_some_and(|tile| tile.supports_furniture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<TileCatalog> {
        Arc::new(TileCatalog::from_tiles([
            Tile::new("grass", "terrain").with_flammability(80),
            Tile::new("boulder", "terrain").with_levels(vec![HeightLevel::solid(0)]),
            Tile::new("tree", "terrain").with_levels(vec![
                HeightLevel::solid(0),
                HeightLevel::open(1),
                HeightLevel::open(2),
            ]),
            Tile::new("table", "furniture")
                .with_furniture_support()
                .with_levels(vec![HeightLevel::open(0), HeightLevel::solid(1)]),
            Tile::new("bridge_rope", "bridge").with_connections([3, 4]),
            Tile::new("ladder", "terrain").with_connections([2]),
        ]))
    }

    #[test]
    fn place_then_lookup() {
        let mut grid = TileGrid::new(catalog());
        assert!(grid.place(1, 3, 4, 0, "grass"));
        let found = grid.tile_at(1, 3, 4, 0).unwrap();
        assert_eq!(found.id, "grass");
        assert_eq!(found.tile.flammability, 80);
        assert!(grid.tile_at(1, 3, 4, 1).is_none());
        assert!(grid.tile_at(2, 3, 4, 0).is_none());
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut grid = TileGrid::new(catalog());
        assert!(!grid.place(6, 0, 0, 0, "grass"));
        assert!(!grid.place(0, 50, 0, 0, "grass"));
        assert!(!grid.place(0, 0, -1, 0, "grass"));
        assert!(!grid.place(0, 0, 0, 3, "grass"));
        assert!(!grid.place(0, 0, 0, -1, "grass"));
        assert_eq!(grid.placement_count(), 0);
        assert!(grid.tile_at(-1, 0, 0, 0).is_none());
    }

    #[test]
    fn unknown_ids_are_stored_but_do_not_resolve() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 0, 0, 0, "mystery");
        assert_eq!(grid.tile_id_at(1, 0, 0, 0), Some("mystery"));
        assert!(grid.tile_at(1, 0, 0, 0).is_none());
        let pos = CellPos::new(1, 0, 0).unwrap();
        let (tile, level) = grid.level_at(pos, 0).unwrap();
        assert_eq!(tile.id, "empty");
        assert!(level.passable);
    }

    #[test]
    fn missing_height_level_degrades_to_fallback() {
        let mut grid = TileGrid::new(catalog());
        // boulder only defines level 0
        grid.place(1, 0, 0, 2, "boulder");
        let pos = CellPos::new(1, 0, 0).unwrap();
        let (tile, _) = grid.level_at(pos, 2).unwrap();
        assert_eq!(tile.id, "empty");
        assert!(grid.can_traverse(1, 1, 0, 0, 0));
    }

    #[test]
    fn empty_column_is_traversable() {
        let grid = TileGrid::new(catalog());
        assert!(grid.can_traverse(1, 1, 10, 10, 0));
        assert!(!grid.can_traverse(1, 1, 50, 10, 5));
    }

    #[test]
    fn short_actors_blocked_tall_actors_step_over() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 5, 5, 0, "boulder");
        assert!(!grid.can_traverse(1, 1, 5, 5, 0));
        assert!(grid.can_traverse(1, 1, 5, 5, 1));

        grid.place(1, 6, 6, 0, "table");
        grid.place(1, 6, 6, 1, "table");
        assert!(!grid.can_traverse(1, 1, 6, 6, 1));
        assert!(grid.can_traverse(1, 1, 6, 6, 2));
    }

    #[test]
    fn cross_layer_requires_declared_bridge() {
        let mut grid = TileGrid::new(catalog());
        grid.place(3, 25, 10, 0, "bridge_rope");
        assert!(grid.can_traverse(3, 4, 25, 10, 1));
        assert!(!grid.can_traverse(3, 2, 25, 10, 1));
        // Only the source cell's declaration counts.
        assert!(!grid.can_traverse(4, 3, 25, 10, 1));
        // Connections on a non-bridge tile are ignored.
        grid.place(1, 0, 0, 0, "ladder");
        assert!(!grid.can_traverse(1, 2, 0, 0, 1));
    }

    #[test]
    fn furniture_support_reads_floor() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 2, 2, 0, "table");
        grid.place(1, 3, 3, 1, "table");
        assert!(grid.supports_furniture(1, 2, 2));
        assert!(!grid.supports_furniture(1, 3, 3));
        assert!(!grid.supports_furniture(1, 99, 3));
    }

    #[test]
    fn occupied_lists_layer_slots() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 0, 0, 0, "tree");
        grid.place(1, 0, 0, 1, "tree");
        grid.place(2, 0, 0, 0, "grass");
        let slots: Vec<_> = grid.occupied(1).collect();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|(pos, _, id)| pos.layer == 1 && *id == "tree"));
        assert_eq!(grid.occupied(9).count(), 0);
    }
}
