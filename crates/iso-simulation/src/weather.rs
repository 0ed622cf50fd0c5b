use iso_core::{CellPos, GRID_HEIGHT, GRID_WIDTH, GROUND_LAYER};
use rand::Rng;
use tracing::{debug, info};

use crate::context::SimContext;
use crate::emitter::{Emitter, EmitterKind};
use crate::environment::Weather;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Screen size the precipitation emitters cover.
const SCREEN_WIDTH: f32 = 800.0;
const SCREEN_HEIGHT: f32 = 600.0;

/// Maintains the rain and snow pools, rain splashes and the weather
/// overlay cue.
///
/// Pools are reconciled every tick; the overlay only changes when the
/// weather differs from the one it was last started for.
#[derive(Debug, Default)]
pub struct WeatherSystem {
    overlay: Option<&'static str>,
    splashes: u64,
}

impl WeatherSystem {
    /// A system with no overlay playing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The overlay cue currently playing.
    pub fn overlay(&self) -> Option<&'static str> {
        self.overlay
    }

    /// Splashes spawned since the start of the run.
    pub fn splashes(&self) -> u64 {
        self.splashes
    }

    fn rain_splashes(&mut self, ctx: &mut SimContext<'_>) {
        let settings = ctx.config;
        let config = &settings.weather;
        let mut soaked = 0;
        for x in (0..GRID_WIDTH).step_by(config.sample_stride) {
            for y in (0..GRID_HEIGHT).step_by(config.sample_stride) {
                if ctx.rng.random::<f64>() >= config.splash_chance {
                    continue;
                }
                let cell = CellPos {
                    layer: GROUND_LAYER,
                    x,
                    y,
                };
                let count = 3 + ctx.rng.random_range(0..=3);
                ctx.spawn(Emitter::splash(cell, count));
                ctx.env.wetness.add_at(cell, config.splash_wetness);
                soaked += 1;
            }
        }
        self.splashes += soaked;
        if soaked > 0 {
            debug!(tick = ctx.tick(), soaked, "rain splashes");
        }
    }

    fn sync_overlay(&mut self, ctx: &mut SimContext<'_>, weather: Weather) {
        let wanted = weather.overlay_cue();
        if wanted == self.overlay {
            return;
        }
        let settings = ctx.config;
        let config = &settings.weather;
        if let Some(old) = self.overlay {
            ctx.stop_overlay(old, config.overlay_fade_ms);
        }
        if let Some(cue) = wanted {
            let volume = match weather {
                Weather::Snow => config.snow_volume,
                _ => config.rain_volume,
            };
            ctx.start_overlay(cue, volume);
        }
        info!(weather = %weather, "weather overlay switched");
        self.overlay = wanted;
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let weather = ctx.env.weather;
        let settings = ctx.config;
        let config = &settings.weather;
        match weather {
            Weather::Rain => {
                ctx.clear_pool(EmitterKind::Snow);
                if ctx.emitters.is_empty(EmitterKind::Rain) {
                    ctx.spawn(Emitter::rain(SCREEN_WIDTH, SCREEN_HEIGHT, config.rain_intensity));
                }
                self.rain_splashes(ctx);
            }
            Weather::Snow => {
                ctx.clear_pool(EmitterKind::Rain);
                if ctx.emitters.is_empty(EmitterKind::Snow) {
                    ctx.spawn(Emitter::snow(SCREEN_WIDTH, SCREEN_HEIGHT, config.snow_intensity));
                }
            }
            Weather::Clear => {
                ctx.clear_pool(EmitterKind::Rain);
                ctx.clear_pool(EmitterKind::Snow);
            }
        }
        self.sync_overlay(ctx, weather);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Dries the world by a fixed amount per in-game hour while it is not
/// raining.
#[derive(Debug, Default)]
pub struct WetnessSystem {
    pending_hours: f32,
}

impl WetnessSystem {
    /// A system with no drying time banked.
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for WetnessSystem {
    fn name(&self) -> &str {
        "wetness"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let per_hour = ctx.config.weather.evaporation_per_hour;
        if per_hour == 0 || ctx.env.weather == Weather::Rain {
            self.pending_hours = 0.0;
            return Ok(());
        }
        self.pending_hours += ctx.step.hours;
        if self.pending_hours < 1.0 {
            return Ok(());
        }
        let whole = self.pending_hours.floor();
        self.pending_hours -= whole;
        let amount = (whole * f32::from(per_hour)).min(f32::from(u8::MAX)) as u8;
        let cells = ctx.env.wetness.dry_all(amount);
        if cells > 0 {
            ctx.emit(
                SimEventKind::Evaporated { cells },
                format!("{cells} cell(s) dried by {amount}"),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
