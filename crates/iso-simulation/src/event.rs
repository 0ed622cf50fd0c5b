use iso_core::{CellPos, ScreenPoint};

use crate::emitter::EmitterKind;
use crate::environment::Weather;

/// What kind of simulation event occurred.
///
/// Audio and particle variants are requests to external collaborators; the
/// rest describe state changes inside the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEventKind {
    // Audio
    /// A one-shot sound effect.
    SoundPlayed {
        /// Cue name.
        cue: String,
        /// Volume, 0-128.
        volume: u8,
        /// Stereo pan derived from world x, `x / 50 - 0.5`.
        pan: f32,
        /// Attenuation distance, 1.0 at the listener.
        distance: f32,
    },
    /// A looping ambient overlay started.
    OverlayStarted {
        /// Cue name.
        cue: String,
        /// Volume, 0-128.
        volume: u8,
    },
    /// A looping ambient overlay stopped.
    OverlayStopped {
        /// Cue name.
        cue: String,
        /// Fade-out duration.
        fade_ms: u32,
    },
    /// Background music switched.
    MusicCrossfade {
        /// Track that was playing, if any.
        from: Option<String>,
        /// Track now playing.
        to: String,
        /// Crossfade duration.
        fade_ms: u32,
    },

    // Particles
    /// An emitter was created.
    EmitterSpawned {
        /// Effect type.
        kind: EmitterKind,
        /// Screen-space origin.
        origin: ScreenPoint,
        /// Effect strength.
        intensity: f32,
        /// Burst size.
        count: u32,
        /// Grid cell, when the effect has one.
        cell: Option<CellPos>,
    },
    /// A whole emitter pool was emptied because its condition cleared.
    EmitterCleared {
        /// Effect type.
        kind: EmitterKind,
        /// Emitters removed.
        count: usize,
    },

    // Propagation
    /// A cell caught fire.
    Ignited {
        /// The burning cell.
        cell: CellPos,
        /// Whether it caught from a neighbour rather than igniting on its own.
        spread: bool,
    },
    /// A fire burned out and left smoke.
    BurnedOut {
        /// The cell that was burning.
        cell: CellPos,
    },
    /// Lightning struck.
    LightningStrike {
        /// Struck cell.
        cell: CellPos,
    },
    /// Evaporation dried the world.
    Evaporated {
        /// Cells that lost wetness.
        cells: usize,
    },
    /// The weather mode changed.
    WeatherChanged {
        /// Previous weather.
        from: Weather,
        /// New weather.
        to: Weather,
    },

    // Actors
    /// An actor moved to a new cell.
    ActorMoved {
        /// Actor index.
        actor: usize,
        /// Where it was.
        from: CellPos,
        /// Where it is now.
        to: CellPos,
    },
    /// A move request was refused.
    MoveBlocked {
        /// Actor index.
        actor: usize,
        /// Where the actor stayed.
        at: CellPos,
        /// Why the move was refused.
        reason: String,
    },
}

impl SimEventKind {
    /// Check whether this event concerns a given cell.
    pub fn involves_cell(&self, pos: CellPos) -> bool {
        match self {
            Self::Ignited { cell, .. }
            | Self::BurnedOut { cell }
            | Self::LightningStrike { cell } => *cell == pos,
            Self::EmitterSpawned { cell, .. } => *cell == Some(pos),
            Self::ActorMoved { from, to, .. } => *from == pos || *to == pos,
            Self::MoveBlocked { at, .. } => *at == pos,
            _ => false,
        }
    }

    /// Check whether this event concerns a given actor.
    pub fn involves_actor(&self, id: usize) -> bool {
        match self {
            Self::ActorMoved { actor, .. } | Self::MoveBlocked { actor, .. } => *actor == id,
            _ => false,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events concerning the given cell.
    pub fn events_for_cell(&self, pos: CellPos) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves_cell(pos)).collect()
    }

    /// Return all events concerning the given actor.
    pub fn events_for_actor(&self, id: usize) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves_actor(id)).collect()
    }

    /// Count events whose kind matches a predicate.
    pub fn count(&self, pred: impl Fn(&SimEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }

    /// Hand every recorded event to a collaborator, leaving the log empty.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
