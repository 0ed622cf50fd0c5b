use iso_core::{CellPos, GRID_HEIGHT, GRID_WIDTH, GROUND_LAYER};
use rand::Rng;

use crate::context::SimContext;
use crate::emitter::Emitter;
use crate::error::SimResult;
use crate::system::System;

/// Spawns short-lived sway emitters over ground tiles that move in the wind.
#[derive(Debug, Default)]
pub struct GrassSystem;

impl System for GrassSystem {
    fn name(&self) -> &str {
        "grass"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let settings = ctx.config;
        let grass = &settings.grass;
        for x in (0..GRID_WIDTH).step_by(grass.sample_stride) {
            for y in (0..GRID_HEIGHT).step_by(grass.sample_stride) {
                let cell = CellPos {
                    layer: GROUND_LAYER,
                    x,
                    y,
                };
                let sways = ctx.world.grid.floor(cell).is_some_and(|tile| tile.wind_sway);
                if sways && ctx.rng.random::<f64>() < grass.chance {
                    ctx.spawn_capped(
                        Emitter::grass(cell, grass.blades, grass.lifetime),
                        grass.max_emitters,
                    );
                }
            }
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
