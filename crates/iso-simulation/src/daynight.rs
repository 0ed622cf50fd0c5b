use tracing::info;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

const DAY_TRACK: &str = "day_ambient";
const NIGHT_TRACK: &str = "night_ambient";
const CROSSFADE_MS: u32 = 3000;

/// Switches background music when the clock crosses 06:00 or 18:00.
#[derive(Debug, Default)]
pub struct DayNightSystem {
    track: Option<&'static str>,
}

impl DayNightSystem {
    /// A system with no music playing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The track currently playing.
    pub fn track(&self) -> Option<&'static str> {
        self.track
    }

    fn sync(&mut self, ctx: &mut SimContext<'_>) {
        let wanted = if ctx.clock.is_night() {
            NIGHT_TRACK
        } else {
            DAY_TRACK
        };
        if self.track == Some(wanted) {
            return;
        }
        info!(hour = ctx.clock.hour(), track = wanted, "music crossfade");
        ctx.emit(
            SimEventKind::MusicCrossfade {
                from: self.track.map(str::to_string),
                to: wanted.to_string(),
                fade_ms: CROSSFADE_MS,
            },
            format!("music -> {wanted}"),
        );
        self.track = Some(wanted);
    }
}

impl System for DayNightSystem {
    fn name(&self) -> &str {
        "day_night"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.sync(ctx);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.sync(ctx);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
