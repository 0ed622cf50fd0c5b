//! Core data model for the layered isometric world.
//!
//! This crate holds everything the simulation reads and mutates but none of
//! the per-tick behaviour: the tile catalog, the six-layer occupancy grid,
//! per-cell wetness and biome classification. Catalogs and maps are loaded
//! from JSON; loading problems are reported as [`IsoError`] and never leave
//! the world in an undefined state.

/// Biome classification from elevation and moisture.
pub mod biome;
/// Grid dimensions, validated cell positions and isometric projection.
pub mod coords;
/// Error types used throughout the crate.
pub mod error;
/// The dense layer/cell/height-level occupancy map.
pub mod grid;
/// Tile definitions and the tile catalog.
pub mod tile;
/// Per-cell wetness accumulator.
pub mod wetness;
/// The world state and map loading.
pub mod world;

/// Re-export biome types.
pub use biome::{Biome, BiomeMap};
/// Re-export coordinate types and grid dimensions.
pub use coords::{
    CellPos, GRID_HEIGHT, GRID_WIDTH, GROUND_LAYER, LAYER_COUNT, MAX_HEIGHT_LEVELS, ScreenPoint,
    project,
};
/// Re-export error types.
pub use error::{IsoError, IsoResult};
/// Re-export grid types.
pub use grid::{TileGrid, TileRef};
/// Re-export tile types.
pub use tile::{HeightLevel, LightEmission, Tile, TileCatalog};
/// Re-export the wetness map.
pub use wetness::{MAX_WETNESS, WetnessMap};
/// Re-export world types.
pub use world::{MapReport, World};
