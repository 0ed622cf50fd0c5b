use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::{CellPos, GRID_HEIGHT, GRID_WIDTH};

/// Coarse terrain classification derived from elevation and moisture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    /// Elevation above 0.7.
    Mountain,
    /// Moisture above 0.7.
    Swamp,
    /// Low and dry.
    Desert,
    /// Moderately moist.
    Forest,
    /// Everything else.
    Plains,
    /// Underground, sky layers, or no biome data.
    None,
}

impl Biome {
    /// Classify a normalised elevation/moisture pair.
    pub fn classify(elevation: f32, moisture: f32) -> Self {
        if elevation > 0.7 {
            Self::Mountain
        } else if moisture > 0.7 {
            Self::Swamp
        } else if moisture < 0.3 && elevation < 0.3 {
            Self::Desert
        } else if moisture > 0.5 {
            Self::Forest
        } else {
            Self::Plains
        }
    }

    /// Multiplier applied to fog intensity.
    pub fn fog_factor(self) -> f32 {
        match self {
            Self::Swamp => 1.5,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mountain => "mountain",
            Self::Swamp => "swamp",
            Self::Desert => "desert",
            Self::Forest => "forest",
            Self::Plains => "plains",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Elevation and moisture grids, `GRID_WIDTH x GRID_HEIGHT`, used only for
/// biome classification of the surface layers.
#[derive(Debug, Clone, Default)]
pub struct BiomeMap {
    elevation: Vec<f32>,
    moisture: Vec<f32>,
}

impl BiomeMap {
    /// Build from `[x][y]` nested grids. Missing entries read as 0.0.
    pub fn from_grids(elevation: &[Vec<f32>], moisture: &[Vec<f32>]) -> Self {
        Self {
            elevation: flatten(elevation),
            moisture: flatten(moisture),
        }
    }

    /// Whether any biome data was loaded.
    pub fn is_empty(&self) -> bool {
        self.elevation.is_empty()
    }

    /// Biome of a cell. Only layers 1 and 2 have one.
    pub fn biome_at(&self, pos: CellPos) -> Biome {
        if !(1..=2).contains(&pos.layer) || self.is_empty() {
            return Biome::None;
        }
        let i = pos.x * GRID_HEIGHT + pos.y;
        Biome::classify(self.elevation[i], self.moisture[i])
    }
}

fn flatten(rows: &[Vec<f32>]) -> Vec<f32> {
    let mut flat = vec![0.0; GRID_WIDTH * GRID_HEIGHT];
    for (x, row) in rows.iter().take(GRID_WIDTH).enumerate() {
        for (y, value) in row.iter().take(GRID_HEIGHT).enumerate() {
            flat[x * GRID_HEIGHT + y] = *value;
        }
    }
    flat
}
