use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coords::MAX_HEIGHT_LEVELS;
use crate::error::{IsoError, IsoResult};

/// Id of the synthetic tile returned for unknown references.
pub const FALLBACK_TILE_ID: &str = "empty";
/// Tile type that enables cross-layer traversal.
pub const BRIDGE_TYPE: &str = "bridge";

const DEFAULT_VIEW: &str = "default";

/// Light emitted by a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightEmission {
    /// Brightness, 0 means dark.
    pub intensity: i32,
    /// Reach in screen pixels.
    pub radius: i32,
    /// RGB colour.
    pub color: [u8; 3],
}

impl Default for LightEmission {
    fn default() -> Self {
        Self {
            intensity: 0,
            radius: 0,
            color: [255, 255, 255],
        }
    }
}

/// One stacked geometry slot of a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightLevel {
    /// Physical height compared against an actor's height.
    pub height: i32,
    /// Whether actors may walk through this slot.
    pub passable: bool,
    /// Whether light passes through this slot.
    pub transparent: bool,
    /// Texture reference per view name (`default` at minimum).
    pub views: BTreeMap<String, String>,
    /// Closed occlusion outline in tile-local pixels. Empty when transparent,
    /// unless the tile blocks sight.
    pub outline: Vec<(i32, i32)>,
}

impl HeightLevel {
    /// A passable, transparent level with no texture.
    pub fn open(height: i32) -> Self {
        Self {
            height,
            passable: true,
            transparent: true,
            views: BTreeMap::from([(DEFAULT_VIEW.to_string(), String::new())]),
            outline: Vec::new(),
        }
    }

    /// An impassable, opaque level with the default occlusion quad.
    pub fn solid(height: i32) -> Self {
        Self {
            passable: false,
            transparent: false,
            outline: default_outline(),
            ..Self::open(height)
        }
    }

    /// The `default` view's texture reference, if any.
    pub fn default_view(&self) -> Option<&str> {
        self.views.get(DEFAULT_VIEW).map(String::as_str)
    }

    /// Outline edges as closed line segments.
    pub fn segments(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        let n = self.outline.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| (self.outline[i], self.outline[(i + 1) % n]))
    }
}

fn default_outline() -> Vec<(i32, i32)> {
    vec![(0, 0), (64, 0), (64, 32), (0, 32)]
}

/// An immutable tile definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Unique catalog key.
    pub id: String,
    /// Tile family, e.g. `terrain`, `furniture`, `bridge`.
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Layer this tile is usually placed on.
    pub preferred_layer: usize,
    /// Whether the tile blocks line of sight as a whole.
    pub blocks_sight: bool,
    /// Geometry slots, indexed by height level.
    pub height_levels: Vec<HeightLevel>,
    /// Whether furniture may be placed on top of this tile.
    pub supports_furniture: bool,
    /// Layers reachable from this tile when it is a bridge.
    pub connects_layers: Vec<usize>,
    /// Emitted light, if any.
    pub light: Option<LightEmission>,
    /// Ignition susceptibility, 0..=100.
    pub flammability: u8,
    /// Wetness at which the tile counts as soaked.
    pub wetness_threshold: u8,
    /// Animation frame texture references.
    pub animation_frames: Vec<String>,
    /// Frames advanced per second of elapsed time.
    pub animation_speed: f32,
    /// Whether the tile sways in the wind.
    pub wind_sway: bool,
}

impl Tile {
    /// A minimal tile with one open level at height 0.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            description: String::new(),
            preferred_layer: 1,
            blocks_sight: false,
            height_levels: vec![HeightLevel::open(0)],
            supports_furniture: false,
            connects_layers: Vec::new(),
            light: None,
            flammability: 0,
            wetness_threshold: 10,
            animation_frames: Vec::new(),
            animation_speed: 0.1,
            wind_sway: false,
        }
    }

    /// Replace the geometry slots.
    pub fn with_levels(mut self, levels: Vec<HeightLevel>) -> Self {
        self.height_levels = levels;
        self
    }

    /// Set flammability, clamped to 100.
    pub fn with_flammability(mut self, flammability: u8) -> Self {
        self.flammability = flammability.min(100);
        self
    }

    /// Set the layers this tile connects to.
    pub fn with_connections(mut self, layers: impl IntoIterator<Item = usize>) -> Self {
        self.connects_layers = layers.into_iter().collect();
        self
    }

    /// Set the emitted light.
    pub fn with_light(mut self, light: LightEmission) -> Self {
        self.light = Some(light);
        self
    }

    /// Mark the tile as able to carry furniture.
    pub fn with_furniture_support(mut self) -> Self {
        self.supports_furniture = true;
        self
    }

    /// Mark the tile as swaying in the wind.
    pub fn with_wind_sway(mut self) -> Self {
        self.wind_sway = true;
        self
    }

    /// Set the animation frames and speed.
    pub fn with_animation(mut self, frames: Vec<String>, speed: f32) -> Self {
        self.animation_frames = frames;
        self.animation_speed = speed;
        self
    }

    /// Geometry slot at a height level.
    pub fn level(&self, height_level: usize) -> Option<&HeightLevel> {
        self.height_levels.get(height_level)
    }

    /// Whether this tile belongs to the connecting family.
    pub fn is_bridge(&self) -> bool {
        self.kind == BRIDGE_TYPE
    }

    /// Whether this tile is a bridge that lists `layer` as reachable.
    pub fn connects_to(&self, layer: usize) -> bool {
        self.is_bridge() && self.connects_layers.contains(&layer)
    }

    /// Emitted light, only when it is actually bright.
    pub fn emitted_light(&self) -> Option<LightEmission> {
        self.light.filter(|l| l.intensity > 0)
    }

    /// Texture reference to draw at `time` seconds.
    pub fn animated_frame(&self, time: f32) -> &str {
        if self.animation_frames.is_empty() {
            return self
                .height_levels
                .first()
                .and_then(HeightLevel::default_view)
                .unwrap_or("");
        }
        let count = self.animation_frames.len();
        let frame = (time * self.animation_speed).max(0.0).floor() as usize % count;
        &self.animation_frames[frame]
    }

    /// Check the height-level invariant: 1..=3 levels, heights unique and below the maximum.
    pub fn validate(&self) -> IsoResult<()> {
        let invalid = |reason: String| IsoError::InvalidTile {
            id: self.id.clone(),
            reason,
        };
        if self.id.is_empty() {
            return Err(invalid("empty id".into()));
        }
        if self.height_levels.is_empty() {
            return Err(invalid("no height levels".into()));
        }
        if self.height_levels.len() > MAX_HEIGHT_LEVELS {
            return Err(invalid(format!(
                "{} height levels, at most {MAX_HEIGHT_LEVELS} allowed",
                self.height_levels.len()
            )));
        }
        let mut seen = HashSet::new();
        for level in &self.height_levels {
            if level.height < 0 || level.height as usize >= MAX_HEIGHT_LEVELS {
                return Err(invalid(format!("height {} out of range", level.height)));
            }
            if !seen.insert(level.height) {
                return Err(invalid(format!("duplicate height {}", level.height)));
            }
        }
        Ok(())
    }

    fn fallback() -> Self {
        let mut tile = Self::new(FALLBACK_TILE_ID, FALLBACK_TILE_ID);
        tile.description = "Empty tile".into();
        tile
    }
}

// ---------------------------------------------------------------------------
// Document format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    tiles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TileEntry {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    description: String,
    height_levels: Vec<LevelEntry>,
    #[serde(default = "default_preferred_layer")]
    preferred_layer: usize,
    #[serde(default)]
    blocks_sight: bool,
    #[serde(default)]
    supports_furniture: bool,
    #[serde(default)]
    connects_layers: Vec<usize>,
    #[serde(default)]
    emits_light: Option<LightEmission>,
    #[serde(default)]
    flammability: u32,
    #[serde(default = "default_wetness_threshold")]
    wetness_threshold: u32,
    #[serde(default)]
    animation_frames: Vec<String>,
    #[serde(default = "default_animation_speed")]
    animation_speed: f32,
    #[serde(default)]
    wind_sway: bool,
}

#[derive(Debug, Deserialize)]
struct LevelEntry {
    height: i32,
    passable: bool,
    transparent: bool,
    views: BTreeMap<String, String>,
    #[serde(default)]
    edges: Option<Vec<(i32, i32)>>,
}

fn default_preferred_layer() -> usize {
    1
}

fn default_wetness_threshold() -> u32 {
    10
}

fn default_animation_speed() -> f32 {
    0.1
}

impl From<TileEntry> for Tile {
    fn from(entry: TileEntry) -> Self {
        let height_levels = entry
            .height_levels
            .into_iter()
            .map(|lev| {
                let outline = match lev.edges {
                    Some(edges) => edges,
                    None if !lev.transparent || entry.blocks_sight => default_outline(),
                    None => Vec::new(),
                };
                HeightLevel {
                    height: lev.height,
                    passable: lev.passable,
                    transparent: lev.transparent,
                    views: lev.views,
                    outline,
                }
            })
            .collect();
        Self {
            id: entry.id,
            kind: entry.kind,
            description: entry.description,
            preferred_layer: entry.preferred_layer,
            blocks_sight: entry.blocks_sight,
            height_levels,
            supports_furniture: entry.supports_furniture,
            connects_layers: entry.connects_layers,
            light: entry.emits_light,
            flammability: entry.flammability.min(100) as u8,
            wetness_threshold: entry.wetness_threshold.min(u8::MAX as u32) as u8,
            animation_frames: entry.animation_frames,
            animation_speed: entry.animation_speed,
            wind_sway: entry.wind_sway,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Registry of tile definitions, read-only once loaded.
///
/// Lookups never fail hard: [`TileCatalog::resolve`] hands back a synthetic
/// `empty` tile for unknown ids and warns once per id.
#[derive(Debug)]
pub struct TileCatalog {
    tiles: HashMap<String, Tile>,
    fallback: Tile,
    rejected: Vec<String>,
    warned: Mutex<HashSet<String>>,
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            fallback: Tile::fallback(),
            rejected: Vec::new(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Build a catalog from tiles, skipping invalid ones.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut catalog = Self::new();
        for tile in tiles {
            if let Err(e) = catalog.insert(tile) {
                warn!("skipping tile: {e}");
                catalog.rejected.push(e.to_string());
            }
        }
        catalog
    }

    /// Add a validated tile, replacing any tile with the same id.
    pub fn insert(&mut self, tile: Tile) -> IsoResult<()> {
        tile.validate()?;
        self.tiles.insert(tile.id.clone(), tile);
        Ok(())
    }

    /// Parse a catalog document.
    ///
    /// A document that is not JSON or lacks a `tiles` array is an error.
    /// Individual malformed entries are skipped and recorded in
    /// [`TileCatalog::rejected`], leaving a partial catalog.
    pub fn from_json_str(json: &str) -> IsoResult<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (index, value) in doc.tiles.into_iter().enumerate() {
            let label = value
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{index}"));
            let result = serde_json::from_value::<TileEntry>(value)
                .map_err(|e| IsoError::InvalidTile {
                    id: label,
                    reason: e.to_string(),
                })
                .and_then(|entry| catalog.insert(entry.into()));
            if let Err(e) = result {
                warn!("skipping tile entry: {e}");
                catalog.rejected.push(e.to_string());
            }
        }
        debug!(
            tiles = catalog.len(),
            rejected = catalog.rejected.len(),
            "tile catalog parsed"
        );
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> IsoResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| IsoError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Like [`TileCatalog::load`], but an unreadable or malformed file yields
    /// an empty catalog and a logged warning.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("tile catalog unavailable, continuing with an empty one: {e}");
                Self::new()
            }
        }
    }

    /// Look up a tile by id.
    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Look up a tile, degrading to the fallback tile for unknown ids.
    pub fn resolve(&self, id: &str) -> &Tile {
        match self.tiles.get(id) {
            Some(tile) => tile,
            None => {
                self.warn_missing(id);
                &self.fallback
            }
        }
    }

    /// Log a missing-tile warning, once per id.
    pub fn warn_missing(&self, id: &str) {
        let first = match self.warned.lock() {
            Ok(mut warned) => warned.insert(id.to_string()),
            Err(_) => true,
        };
        if first {
            warn!("missing tile '{id}', using empty fallback");
        }
    }

    /// The synthetic tile used for unknown references.
    pub fn fallback(&self) -> &Tile {
        &self.fallback
    }

    /// Whether a tile with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.tiles.contains_key(id)
    }

    /// Number of registered tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the catalog has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All registered tiles, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Every light-emitting tile definition.
    pub fn lights(&self) -> Vec<(&str, LightEmission)> {
        let mut lights: Vec<_> = self
            .tiles
            .values()
            .filter_map(|t| t.emitted_light().map(|l| (t.id.as_str(), l)))
            .collect();
        lights.sort_by_key(|(id, _)| *id);
        lights
    }

    /// Messages for entries skipped while loading.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}
