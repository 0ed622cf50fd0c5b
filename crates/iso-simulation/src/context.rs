use iso_core::World;
use rand::rngs::StdRng;

use crate::actor::Actor;
use crate::clock::{ClockStep, GameClock};
use crate::config::SimConfig;
use crate::emitter::{Emitter, EmitterKind, EmitterPools};
use crate::environment::Environment;
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Mutable context passed to each system during a tick.
pub struct SimContext<'a> {
    /// The tile grid and biome data.
    pub world: &'a mut World,
    /// Weather, wetness and lightning flash.
    pub env: &'a mut Environment,
    /// Active emitters by kind.
    pub emitters: &'a mut EmitterPools,
    /// Actors, read-only to systems.
    pub actors: &'a [Actor],
    /// The game clock, already advanced for this tick.
    pub clock: &'a GameClock,
    /// How far the clock moved this tick.
    pub step: ClockStep,
    /// The event log for emitting events.
    pub events: &'a mut EventLog,
    /// Seeded RNG shared by every system.
    pub rng: &'a mut StdRng,
    /// The simulation configuration.
    pub config: &'a SimConfig,
}

impl SimContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Current tick number.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The first actor, whose position stands in for the camera.
    pub fn lead_actor(&self) -> Option<&Actor> {
        self.actors.first()
    }

    /// Add an emitter and announce it.
    pub fn spawn(&mut self, emitter: Emitter) {
        self.announce(&emitter);
        self.emitters.push(emitter);
    }

    /// Add an emitter to a pool capped at `cap`, evicting the oldest.
    pub fn spawn_capped(&mut self, emitter: Emitter, cap: usize) {
        self.announce(&emitter);
        self.emitters.push_capped(emitter, cap);
    }

    fn announce(&mut self, emitter: &Emitter) {
        let description = match emitter.cell {
            Some(cell) => format!("{} emitter at {cell}", emitter.kind),
            None => format!("{} emitter", emitter.kind),
        };
        self.emit(
            SimEventKind::EmitterSpawned {
                kind: emitter.kind,
                origin: emitter.origin,
                intensity: emitter.intensity,
                count: emitter.count,
                cell: emitter.cell,
            },
            description,
        );
    }

    /// Empty a pool, announcing it only when something was removed.
    pub fn clear_pool(&mut self, kind: EmitterKind) {
        let count = self.emitters.clear(kind);
        if count > 0 {
            self.emit(
                SimEventKind::EmitterCleared { kind, count },
                format!("cleared {count} {kind} emitter(s)"),
            );
        }
    }

    /// Request a one-shot sound panned by world column.
    pub fn play_sound(&mut self, cue: impl Into<String>, volume: u8, x: i32) {
        let cue = cue.into();
        let description = format!("play {cue}");
        self.emit(
            SimEventKind::SoundPlayed {
                cue,
                volume,
                pan: x as f32 / 50.0 - 0.5,
                distance: 1.0,
            },
            description,
        );
    }

    /// Request a looping overlay.
    pub fn start_overlay(&mut self, cue: &str, volume: u8) {
        self.emit(
            SimEventKind::OverlayStarted {
                cue: cue.to_string(),
                volume,
            },
            format!("overlay {cue} on"),
        );
    }

    /// Fade out a looping overlay.
    pub fn stop_overlay(&mut self, cue: &str, fade_ms: u32) {
        self.emit(
            SimEventKind::OverlayStopped {
                cue: cue.to_string(),
                fade_ms,
            },
            format!("overlay {cue} off"),
        );
    }
}
