use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::biome::{Biome, BiomeMap};
use crate::coords::{CellPos, GRID_HEIGHT, GRID_WIDTH, LAYER_COUNT};
use crate::error::{IsoError, IsoResult};
use crate::grid::TileGrid;
use crate::tile::{FALLBACK_TILE_ID, TileCatalog};

#[derive(Debug, Deserialize)]
struct MapDocument {
    map: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    biomes: Option<BiomeDocument>,
}

#[derive(Debug, Deserialize)]
struct Placement {
    height: i32,
    tile: String,
}

#[derive(Debug, Deserialize)]
struct BiomeDocument {
    elev: Vec<Vec<f32>>,
    moist: Vec<Vec<f32>>,
}

/// What happened while applying a map document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapReport {
    /// Slots written into the grid.
    pub placed: usize,
    /// Placements dropped for out-of-range height levels.
    pub dropped: usize,
    /// Layer keys that were ignored, with the reason.
    pub skipped_layers: Vec<String>,
    /// Whether elevation/moisture grids were present.
    pub has_biomes: bool,
}

/// The authoritative world state: the tile grid plus biome data.
#[derive(Debug, Clone)]
pub struct World {
    /// Layered tile occupancy.
    pub grid: TileGrid,
    /// Elevation/moisture used for biome classification.
    pub biomes: BiomeMap,
}

impl World {
    /// An empty world backed by a catalog.
    pub fn new(catalog: Arc<TileCatalog>) -> Self {
        Self {
            grid: TileGrid::new(catalog),
            biomes: BiomeMap::default(),
        }
    }

    /// The tile catalog.
    pub fn catalog(&self) -> &TileCatalog {
        self.grid.catalog()
    }

    /// Biome at a cell; `Biome::None` out of range or without data.
    pub fn biome_at(&self, layer: i32, x: i32, y: i32) -> Biome {
        CellPos::new(layer, x, y).map_or(Biome::None, |pos| self.biomes.biome_at(pos))
    }

    /// Apply a map document.
    ///
    /// Layers keyed `6` or higher are ignored, as are layers whose data does
    /// not parse; short or ragged rows leave the remaining cells empty. The
    /// literal id `empty` marks an unoccupied slot and is not placed.
    pub fn apply_map_str(&mut self, json: &str) -> IsoResult<MapReport> {
        let doc: MapDocument = serde_json::from_str(json)?;
        let mut report = MapReport::default();

        for (key, value) in doc.map {
            let layer = match key.parse::<usize>() {
                Ok(layer) if layer < LAYER_COUNT => layer,
                Ok(_) => {
                    report.skipped_layers.push(format!("{key}: beyond layer count"));
                    continue;
                }
                Err(_) => {
                    warn!("map layer key '{key}' is not a number");
                    report.skipped_layers.push(format!("{key}: not a layer index"));
                    continue;
                }
            };
            let columns: Vec<Vec<Vec<Placement>>> = match serde_json::from_value(value) {
                Ok(columns) => columns,
                Err(e) => {
                    warn!("map layer {layer} is malformed, leaving it empty: {e}");
                    report.skipped_layers.push(format!("{key}: {e}"));
                    continue;
                }
            };
            for (x, column) in columns.iter().take(GRID_WIDTH).enumerate() {
                for (y, stack) in column.iter().take(GRID_HEIGHT).enumerate() {
                    for placement in stack {
                        if placement.tile == FALLBACK_TILE_ID {
                            continue;
                        }
                        if self.grid.place(layer as i32, x as i32, y as i32, placement.height, &placement.tile) {
                            report.placed += 1;
                        } else {
                            report.dropped += 1;
                        }
                    }
                }
            }
        }

        if let Some(biomes) = doc.biomes {
            self.biomes = BiomeMap::from_grids(&biomes.elev, &biomes.moist);
            report.has_biomes = true;
        }

        debug!(
            placed = report.placed,
            dropped = report.dropped,
            skipped = report.skipped_layers.len(),
            "map applied"
        );
        Ok(report)
    }

    /// Read a map file and apply it.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> IsoResult<MapReport> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| IsoError::io(path, e))?;
        self.apply_map_str(&json)
    }

    /// Build a world from a map file, keeping whatever loaded when the file
    /// is unreadable or malformed.
    pub fn load_or_empty(catalog: Arc<TileCatalog>, path: impl AsRef<Path>) -> Self {
        let mut world = Self::new(catalog);
        if let Err(e) = world.load_map(path) {
            warn!("map unavailable, continuing with an empty world: {e}");
        }
        world
    }
}
