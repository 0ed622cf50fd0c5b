use iso_core::{CellPos, GRID_HEIGHT, GRID_WIDTH, GROUND_LAYER};
use rand::Rng;
use tracing::info;

use crate::context::SimContext;
use crate::emitter::Emitter;
use crate::environment::Weather;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Rolls for lightning while it rains.
#[derive(Debug, Default)]
pub struct LightningSystem {
    strikes: u64,
}

impl LightningSystem {
    /// A system that has not struck yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strikes since the start of the run.
    pub fn strikes(&self) -> u64 {
        self.strikes
    }

    /// Strike a uniformly random ground cell: flash, thunder and a spark
    /// burst.
    pub fn strike(&mut self, ctx: &mut SimContext<'_>) {
        let cell = CellPos {
            layer: GROUND_LAYER,
            x: ctx.rng.random_range(0..GRID_WIDTH),
            y: ctx.rng.random_range(0..GRID_HEIGHT),
        };
        ctx.env.flash();
        ctx.play_sound("thunder", 100, cell.x as i32);
        ctx.spawn(Emitter::spark(cell, ctx.config.weather.lightning_sparks));
        ctx.emit(
            SimEventKind::LightningStrike { cell },
            format!("lightning struck {cell}"),
        );
        info!(tick = ctx.tick(), %cell, "lightning strike");
        self.strikes += 1;
    }
}

impl System for LightningSystem {
    fn name(&self) -> &str {
        "lightning"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if ctx.env.weather != Weather::Rain {
            return Ok(());
        }
        if ctx.rng.random::<f64>() < ctx.config.weather.lightning_chance {
            self.strike(ctx);
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
