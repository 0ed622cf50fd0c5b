use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
///
/// Every field has a default, so a JSON file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Seconds of real time per fixed tick.
    pub fixed_dt: f32,
    /// Game clock settings.
    pub clock: ClockConfig,
    /// Fire ignition and spread.
    pub fire: FireConfig,
    /// Rain, snow, wetness and lightning.
    pub weather: WeatherConfig,
    /// Fog trigger and intensity.
    pub fog: FogConfig,
    /// Grass sway sampling and pool policy.
    pub grass: GrassConfig,
}

/// Event log capacity unless configured otherwise.
const DEFAULT_MAX_EVENTS: usize = 10_000;

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_events: DEFAULT_MAX_EVENTS,
            fixed_dt: 1.0 / 60.0,
            clock: ClockConfig::default(),
            fire: FireConfig::default(),
            weather: WeatherConfig::default(),
            fog: FogConfig::default(),
            grass: GrassConfig::default(),
        }
    }
}

/// Game clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Hour of day when the simulation begins.
    pub start_hour: f32,
    /// In-game hours that pass per real-time minute.
    pub game_hours_per_real_minute: f32,
    /// Length of the moon cycle in days.
    pub moon_cycle: u8,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_hour: 12.0,
            game_hours_per_real_minute: 24.0,
            moon_cycle: 29,
        }
    }
}

/// Fire ignition and spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// Base per-tick ignition chance of a dry flammable cell.
    pub ignition_chance: f64,
    /// Wetness at which ignition becomes impossible.
    pub wetness_divisor: f64,
    /// Chance a burning cell ignites a qualifying neighbour.
    pub spread_chance: f64,
    /// Neighbours need flammability strictly above this to catch.
    pub spread_threshold: u8,
    /// Seconds a fire emitter burns before turning to smoke.
    pub fire_lifetime: f32,
    /// Seconds the smoke lingers.
    pub smoke_lifetime: f32,
    /// Volume of the crackle overlay.
    pub crackle_volume: u8,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            ignition_chance: 0.1,
            wetness_divisor: 10.0,
            spread_chance: 0.3,
            spread_threshold: 50,
            fire_lifetime: 5.0,
            smoke_lifetime: 3.0,
            crackle_volume: 60,
        }
    }
}

/// Rain, snow, wetness and lightning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Splash sampling stride in cells along x and y.
    pub sample_stride: usize,
    /// Chance per sampled cell per tick of a splash.
    pub splash_chance: f64,
    /// Wetness added by one splash.
    pub splash_wetness: i32,
    /// Rain emitter intensity.
    pub rain_intensity: f32,
    /// Snow emitter intensity.
    pub snow_intensity: f32,
    /// Rain overlay volume.
    pub rain_volume: u8,
    /// Snow overlay volume.
    pub snow_volume: u8,
    /// Fade applied when an overlay stops, in milliseconds.
    pub overlay_fade_ms: u32,
    /// Per-tick lightning chance while raining.
    pub lightning_chance: f64,
    /// Sparks in one lightning burst.
    pub lightning_sparks: u32,
    /// Wetness removed per cell per in-game hour when not raining. 0 disables.
    pub evaporation_per_hour: u8,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            sample_stride: 5,
            splash_chance: 0.1,
            splash_wetness: 1,
            rain_intensity: 1.0,
            snow_intensity: 0.7,
            rain_volume: 40,
            snow_volume: 30,
            overlay_fade_ms: 500,
            lightning_chance: 0.02,
            lightning_sparks: 100,
            evaporation_per_hour: 1,
        }
    }
}

/// Fog trigger and intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    /// Layers below this are foggy at any hour.
    pub layer_threshold: i32,
    /// Cell sampled for the biome factor.
    pub sample_x: i32,
    /// Cell sampled for the biome factor.
    pub sample_y: i32,
    /// Intensity before the biome factor.
    pub base_intensity: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            layer_threshold: 2,
            sample_x: 25,
            sample_y: 25,
            base_intensity: 1.0,
        }
    }
}

/// Grass sway sampling and pool policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    /// Sampling stride in cells along x and y.
    pub sample_stride: usize,
    /// Chance per sampled swaying tile per tick.
    pub chance: f64,
    /// Blades per sway emitter.
    pub blades: u32,
    /// Seconds a sway emitter lives.
    pub lifetime: f32,
    /// Pool cap; the oldest emitter is evicted beyond it.
    pub max_emitters: usize,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            sample_stride: 5,
            chance: 0.2,
            blades: 10,
            lifetime: 2.0,
            max_emitters: 64,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the hour of day when the simulation begins.
    pub fn with_start_hour(mut self, hour: f32) -> Self {
        self.clock.start_hour = hour;
        self
    }

    /// Set the fixed timestep in seconds.
    pub fn with_fixed_dt(mut self, dt: f32) -> Self {
        self.fixed_dt = dt;
        self
    }

    /// Replace the fire settings.
    pub fn with_fire(mut self, fire: FireConfig) -> Self {
        self.fire = fire;
        self
    }

    /// Replace the weather settings.
    pub fn with_weather(mut self, weather: WeatherConfig) -> Self {
        self.weather = weather;
        self
    }

    /// Replace the grass settings.
    pub fn with_grass(mut self, grass: GrassConfig) -> Self {
        self.grass = grass;
        self
    }

    /// Parse a JSON override document and validate the result.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::ConfigLoad(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Reject probabilities outside `[0, 1]` and non-positive durations.
    pub fn validate(&self) -> SimResult<()> {
        let probabilities = [
            ("fire.ignition_chance", self.fire.ignition_chance),
            ("fire.spread_chance", self.fire.spread_chance),
            ("weather.splash_chance", self.weather.splash_chance),
            ("weather.lightning_chance", self.weather.lightning_chance),
            ("grass.chance", self.grass.chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }

        let durations = [
            ("fixed_dt", self.fixed_dt),
            ("clock.game_hours_per_real_minute", self.clock.game_hours_per_real_minute),
            ("fire.fire_lifetime", self.fire.fire_lifetime),
            ("fire.smoke_lifetime", self.fire.smoke_lifetime),
            ("grass.lifetime", self.grass.lifetime),
        ];
        for (name, value) in durations {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(0.0..24.0).contains(&self.clock.start_hour) {
            return Err(SimError::InvalidConfig(format!(
                "clock.start_hour must be within [0, 24), got {}",
                self.clock.start_hour
            )));
        }
        if self.clock.moon_cycle == 0 {
            return Err(SimError::InvalidConfig("clock.moon_cycle must be positive".into()));
        }
        if !(self.fire.wetness_divisor > 0.0 && self.fire.wetness_divisor.is_finite()) {
            return Err(SimError::InvalidConfig(
                "fire.wetness_divisor must be positive".into(),
            ));
        }
        if self.weather.sample_stride == 0 || self.grass.sample_stride == 0 {
            return Err(SimError::InvalidConfig("sample strides must be positive".into()));
        }
        Ok(())
    }
}
