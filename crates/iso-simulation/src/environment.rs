use std::fmt;
use std::str::FromStr;

use iso_core::WetnessMap;
use serde::{Deserialize, Serialize};

use crate::emitter::Ambient;

/// Global weather mode. Set by an external driver; never changes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// No precipitation.
    #[default]
    Clear,
    /// Rain: splashes, wetness, lightning.
    Rain,
    /// Snow.
    Snow,
}

impl Weather {
    /// Name of the ambient overlay cue for this weather, if any.
    pub fn overlay_cue(self) -> Option<&'static str> {
        match self {
            Self::Clear => None,
            Self::Rain => Some("rain_patter"),
            Self::Snow => Some("snow_wind"),
        }
    }

    /// Whether anything is falling from the sky.
    pub fn is_precipitating(self) -> bool {
        !matches!(self, Self::Clear)
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
        };
        f.write_str(name)
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "rain" => Ok(Self::Rain),
            "snow" => Ok(Self::Snow),
            other => Err(format!("unknown weather '{other}' (expected clear, rain or snow)")),
        }
    }
}

/// Environmental state the propagation systems read and mutate.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// The authoritative weather mode.
    pub weather: Weather,
    /// Per-cell wetness.
    pub wetness: WetnessMap,
    /// Screen-flash time remaining after a lightning strike.
    pub flash_timer: f32,
    /// Current wind, in `[-1, 1]` while precipitating and 0 otherwise.
    pub wind: f32,
}

impl Environment {
    /// Clear weather, bone-dry world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lightning flash.
    pub fn flash(&mut self) {
        self.flash_timer = 1.0;
    }

    /// Run down the flash timer by `dt` seconds.
    pub fn decay_flash(&mut self, dt: f32) {
        self.flash_timer = (self.flash_timer - dt).max(0.0);
    }

    /// Whether a flash is on screen.
    pub fn is_flashing(&self) -> bool {
        self.flash_timer > 0.0
    }

    /// Shared ambient conditions handed to every emitter.
    pub fn ambient(&self) -> Ambient {
        Ambient {
            wind: self.wind,
            intensity: 1.0,
        }
    }
}
