use iso_core::{GROUND_LAYER, ScreenPoint};
use tracing::debug;

use crate::context::SimContext;
use crate::emitter::{Emitter, EmitterKind};
use crate::error::SimResult;
use crate::system::System;

/// Where the fog bank is drawn.
const FOG_ORIGIN: ScreenPoint = ScreenPoint::new(400.0, 300.0);

/// Keeps a single fog emitter while the lead actor is underground or the
/// hour is foggy.
#[derive(Debug, Default)]
pub struct FogSystem;

impl FogSystem {
    /// Whether fog should be present this tick.
    pub fn is_foggy(ctx: &SimContext<'_>) -> bool {
        let layer = ctx
            .lead_actor()
            .map_or(GROUND_LAYER as i32, |actor| actor.layer);
        layer < ctx.config.fog.layer_threshold || ctx.clock.is_foggy_hour()
    }
}

impl System for FogSystem {
    fn name(&self) -> &str {
        "fog"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if !Self::is_foggy(ctx) {
            ctx.clear_pool(EmitterKind::Fog);
            return Ok(());
        }
        if ctx.emitters.is_empty(EmitterKind::Fog) {
            let fog = &ctx.config.fog;
            let layer = ctx
                .lead_actor()
                .map_or(GROUND_LAYER as i32, |actor| actor.layer);
            let biome = ctx.world.biome_at(layer, fog.sample_x, fog.sample_y);
            let intensity = fog.base_intensity * biome.fog_factor();
            debug!(%biome, intensity, "fog rolling in");
            ctx.spawn(Emitter::fog(FOG_ORIGIN, intensity));
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
