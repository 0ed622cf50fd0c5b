//! Tick-based environmental simulation over an [`iso_core::World`].
//!
//! A [`Simulation`] owns the world together with weather, wetness, the
//! emitter pools and the game clock. Each tick applies actor movement, ages
//! emitters, advances the clock and runs the registered systems (weather,
//! wetness, fog, grass, fire, day-night music, lightning). Audio and
//! particle requests leave the core as [`SimEvent`]s; renderers read the
//! committed state afterwards.

/// Actors, movement requests and passability checks.
pub mod actor;
/// Game clock: tick counter, hour of day and moon phase.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// Background music switching at dawn and dusk.
pub mod daynight;
/// Particle emitters and their per-kind pools.
pub mod emitter;
/// Weather mode, wetness and lightning flash.
pub mod environment;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// Fire ignition and breadth-first spread.
pub mod fire;
/// Fog for underground layers and foggy hours.
pub mod fog;
/// Wind-swayed grass emitters.
pub mod grass;
/// Occluders, light sources and ambient tint for the renderer.
pub mod lighting;
/// Lightning strikes during rain.
pub mod lightning;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that all simulation systems implement.
pub mod system;
/// Precipitation, splashes and evaporation.
pub mod weather;

pub use actor::{Actor, Blocked, MoveRequest, Movement};
pub use clock::{ClockStep, GameClock};
/// Re-exports of the configuration types.
pub use config::{ClockConfig, FireConfig, FogConfig, GrassConfig, SimConfig, WeatherConfig};
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
pub use emitter::{Ambient, Emitter, EmitterKind, EmitterPools, EmitterView};
pub use environment::{Environment, Weather};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], and [`event::SimEventKind`].
pub use event::{EventLog, SimEvent, SimEventKind};
pub use lighting::{LightSource, Segment};
/// Re-exports of the orchestrator types.
pub use simulation::{SimSnapshot, Simulation, TickInput};
/// Re-export of [`system::System`].
pub use system::System;
