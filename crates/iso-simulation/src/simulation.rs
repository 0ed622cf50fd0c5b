use std::time::Instant;

use iso_core::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actor::{Actor, MoveRequest, apply_movement, footstep_cue};
use crate::clock::{ClockStep, GameClock};
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::daynight::DayNightSystem;
use crate::emitter::{Emitter, EmitterKind, EmitterPools, EmitterView};
use crate::environment::{Environment, Weather};
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEventKind};
use crate::fire::FireSystem;
use crate::fog::FogSystem;
use crate::grass::GrassSystem;
use crate::lighting::{self, LightSource, Segment};
use crate::lightning::LightningSystem;
use crate::system::System;
use crate::weather::{WeatherSystem, WetnessSystem};

const FOOTSTEP_VOLUME: u8 = 80;

/// Input for one tick: real seconds elapsed and the movement requests
/// gathered since the previous tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Real seconds since the previous tick.
    pub elapsed: f32,
    /// Movement requests, applied in order.
    pub moves: Vec<MoveRequest>,
}

impl TickInput {
    /// A tick of `elapsed` seconds with no movement.
    pub fn idle(elapsed: f32) -> Self {
        Self {
            elapsed,
            moves: Vec::new(),
        }
    }
}

/// Committed post-tick state, for display and for collaborators that only
/// read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    /// Ticks run.
    pub tick: u64,
    /// Hour of day.
    pub hour: f32,
    /// Completed in-game days.
    pub day: u64,
    /// Moon phase.
    pub moon_phase: u8,
    /// Weather mode.
    pub weather: Weather,
    /// Lightning flash remaining.
    pub flash_timer: f32,
    /// Cells with any wetness.
    pub wet_cells: usize,
    /// Sum of wetness over the grid.
    pub total_wetness: u64,
    /// Active emitters per kind.
    pub emitters: Vec<(EmitterKind, usize)>,
    /// Events currently in the log.
    pub events: usize,
}

/// Everything systems may touch, kept apart from the system list so both
/// can be borrowed at once.
struct SimState {
    world: World,
    env: Environment,
    emitters: EmitterPools,
    actors: Vec<Actor>,
    clock: GameClock,
    rng: StdRng,
    events: EventLog,
    config: SimConfig,
}

impl SimState {
    fn context(&mut self, step: ClockStep) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            env: &mut self.env,
            emitters: &mut self.emitters,
            actors: &self.actors,
            clock: &self.clock,
            step,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        }
    }

    fn move_actor(&mut self, request: MoveRequest) -> SimResult<()> {
        let actor = self
            .actors
            .get_mut(request.actor)
            .ok_or(SimError::ActorNotFound(request.actor))?;
        let at = actor.pos();
        let outcome = apply_movement(&self.world.grid, actor, request.movement);
        let x = actor.x;
        let cue = match outcome {
            Ok(_) => footstep_cue(&self.world.grid, actor),
            Err(_) => None,
        };

        let mut ctx = self.context(ClockStep::default());
        match outcome {
            Ok((from, to)) => {
                ctx.emit(
                    SimEventKind::ActorMoved {
                        actor: request.actor,
                        from,
                        to,
                    },
                    format!("actor {} moved {from} -> {to}", request.actor),
                );
                if let Some(cue) = cue {
                    ctx.play_sound(cue, FOOTSTEP_VOLUME, x);
                }
            }
            Err(reason) => {
                debug!(actor = request.actor, %reason, "move refused");
                if let Some(at) = at {
                    ctx.emit(
                        SimEventKind::MoveBlocked {
                            actor: request.actor,
                            at,
                            reason: reason.to_string(),
                        },
                        format!("actor {} blocked at {at}: {reason}", request.actor),
                    );
                }
            }
        }
        Ok(())
    }

    /// Turn burnt-out fires into smoke.
    fn retire(&mut self, expired: Vec<Emitter>) {
        let smoke_lifetime = self.config.fire.smoke_lifetime;
        let mut ctx = self.context(ClockStep::default());
        for emitter in expired {
            if emitter.kind != EmitterKind::Fire {
                continue;
            }
            if let Some(cell) = emitter.cell {
                ctx.emit(SimEventKind::BurnedOut { cell }, format!("fire at {cell} burned out"));
            }
            ctx.spawn(Emitter::smoke(emitter.origin, emitter.cell, smoke_lifetime));
        }
    }
}

/// The top-level simulation orchestrator.
///
/// Owns the world, environment, emitter pools, actors, clock, RNG, event
/// log and registered systems. One tick applies movement, ages emitters,
/// advances the clock and then runs every system in registration order.
pub struct Simulation {
    state: SimState,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
    last_instant: Option<Instant>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.state.clock.tick())
            .field("weather", &self.state.env.weather)
            .field("systems", &self.systems.len())
            .field("emitters", &self.state.emitters.total())
            .field("events", &self.state.events.len())
            .finish()
    }
}

impl Simulation {
    /// Create a new simulation from a world and configuration, with no
    /// systems registered.
    pub fn new(world: World, config: SimConfig) -> Self {
        let clock = GameClock::new(&config.clock);
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Self {
            state: SimState {
                world,
                env: Environment::new(),
                emitters: EmitterPools::new(),
                actors: Vec::new(),
                clock,
                rng,
                events,
                config,
            },
            systems: Vec::new(),
            initialized: false,
            last_instant: None,
        }
    }

    /// Validate the configuration and register the standard environmental
    /// systems.
    pub fn with_default_systems(world: World, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Self::new(world, config);
        sim.add_system(WeatherSystem::new());
        sim.add_system(WetnessSystem::new());
        sim.add_system(FogSystem);
        sim.add_system(GrassSystem);
        sim.add_system(FireSystem::new());
        sim.add_system(DayNightSystem::new());
        sim.add_system(LightningSystem::new());
        Ok(sim)
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Add an actor. Returns its index for move requests.
    pub fn add_actor(&mut self, actor: Actor) -> usize {
        self.state.actors.push(actor);
        self.state.actors.len() - 1
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        for system in &mut self.systems {
            system.init(&mut self.state.context(ClockStep::default()))?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, input: &TickInput) -> SimResult<()> {
        if !self.initialized {
            self.init()?;
        }
        self.state.clock.begin_tick();

        for request in &input.moves {
            if let Err(e) = self.state.move_actor(*request) {
                warn!("ignoring move request: {e}");
            }
        }

        let dt = input.elapsed;
        let state = &mut self.state;
        state.env.decay_flash(dt);
        state.env.wind = if state.env.weather.is_precipitating() {
            state.rng.random_range(-1.0..=1.0)
        } else {
            0.0
        };
        let expired = state.emitters.advance(dt, &state.env.ambient());
        state.retire(expired);

        let step = state.clock.advance(dt);
        for system in &mut self.systems {
            system.tick(&mut self.state.context(step))?;
        }
        Ok(())
    }

    /// Advance the simulation by `n` ticks of the fixed timestep.
    pub fn run(&mut self, n: u64) -> SimResult<()> {
        let input = TickInput::idle(self.state.config.fixed_dt);
        for _ in 0..n {
            self.tick(&input)?;
        }
        Ok(())
    }

    /// Advance by the wall-clock time since the previous real-time tick.
    /// The first call uses the fixed timestep.
    pub fn tick_realtime(&mut self, moves: Vec<MoveRequest>) -> SimResult<()> {
        self.tick_at(Instant::now(), moves)
    }

    /// Advance by the time between the previous real-time tick and `now`.
    /// An instant earlier than the previous one counts as no time passing.
    pub fn tick_at(&mut self, now: Instant, moves: Vec<MoveRequest>) -> SimResult<()> {
        let elapsed = self
            .last_instant
            .map_or(self.state.config.fixed_dt, |last| {
                now.saturating_duration_since(last).as_secs_f32()
            });
        self.last_instant = Some(now);
        self.tick(&TickInput { elapsed, moves })
    }

    /// Change the weather. Pools and cues follow on the next tick.
    pub fn set_weather(&mut self, weather: Weather) {
        let from = self.state.env.weather;
        if from == weather {
            return;
        }
        self.state.env.weather = weather;
        info!(%from, to = %weather, "weather changed");
        let mut ctx = self.state.context(ClockStep::default());
        ctx.emit(
            SimEventKind::WeatherChanged { from, to: weather },
            format!("weather {from} -> {weather}"),
        );
    }

    /// Current weather mode.
    pub fn weather(&self) -> Weather {
        self.state.env.weather
    }

    /// Get a reference to the world.
    pub fn world(&self) -> &World {
        &self.state.world
    }

    /// Get a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.state.world
    }

    /// Weather, wetness and flash state.
    pub fn environment(&self) -> &Environment {
        &self.state.env
    }

    /// Mutable environment, for seeding wetness or forcing a flash.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.state.env
    }

    /// Active emitter pools.
    pub fn emitters(&self) -> &EmitterPools {
        &self.state.emitters
    }

    /// All actors, in index order.
    pub fn actors(&self) -> &[Actor] {
        &self.state.actors
    }

    /// Get a reference to the game clock.
    pub fn clock(&self) -> &GameClock {
        &self.state.clock
    }

    /// Get a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.state.config
    }

    /// Get a reference to the event log.
    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    /// Get a mutable reference to the event log.
    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.state.events
    }

    /// The current tick number.
    pub fn current_tick(&self) -> u64 {
        self.state.clock.tick()
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Render views of every active emitter.
    pub fn emitter_views(&self) -> Vec<EmitterView> {
        self.state.emitters.views()
    }

    /// Opaque edges on a layer.
    pub fn occluders(&self, layer: usize) -> Vec<Segment> {
        lighting::occluders(&self.state.world.grid, layer)
    }

    /// Tile lights on a layer plus the moon.
    pub fn light_sources(&self, layer: usize) -> Vec<LightSource> {
        lighting::light_sources(&self.state.world.grid, layer, &self.state.clock)
    }

    /// Scene tint for the current hour and weather.
    pub fn ambient_tint(&self) -> [u8; 3] {
        lighting::ambient_tint(&self.state.clock, self.state.env.weather)
    }

    /// Summary of the committed state.
    pub fn snapshot(&self) -> SimSnapshot {
        let state = &self.state;
        SimSnapshot {
            tick: state.clock.tick(),
            hour: state.clock.hour(),
            day: state.clock.day(),
            moon_phase: state.clock.moon_phase(),
            weather: state.env.weather,
            flash_timer: state.env.flash_timer,
            wet_cells: state.env.wetness.wet_cells(),
            total_wetness: state.env.wetness.total(),
            emitters: EmitterKind::ALL
                .iter()
                .map(|kind| (*kind, state.emitters.len(*kind)))
                .collect(),
            events: state.events.len(),
        }
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.state.world
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use iso_core::{CellPos, HeightLevel, Tile, TileCatalog};

    use super::*;
    use crate::config::{FireConfig, GrassConfig, WeatherConfig};

    fn catalog() -> Arc<TileCatalog> {
        Arc::new(TileCatalog::from_tiles([
            Tile::new("grass", "terrain"),
            Tile::new("dry_grass", "terrain").with_flammability(100),
            Tile::new("wispy", "terrain").with_wind_sway(),
            Tile::new("boulder", "rock").with_levels(vec![HeightLevel::solid(1)]),
        ]))
    }

    fn world() -> World {
        let mut world = World::new(catalog());
        for pos in CellPos::iter_layer(1) {
            world.grid.place_at(pos, 0, "grass");
        }
        world
    }

    fn quiet() -> SimConfig {
        SimConfig::default().with_fire(FireConfig {
            ignition_chance: 0.0,
            ..FireConfig::default()
        })
    }

    fn sim(config: SimConfig) -> Simulation {
        Simulation::with_default_systems(world(), config).unwrap()
    }

    fn at_tick(sim: &Simulation, tick: u64, pred: impl Fn(&SimEventKind) -> bool) -> usize {
        sim.events()
            .events_at_tick(tick)
            .into_iter()
            .filter(|e| pred(&e.kind))
            .count()
    }

    fn overlay_stopped(cue: &'static str) -> impl Fn(&SimEventKind) -> bool {
        move |k: &SimEventKind| matches!(k, SimEventKind::OverlayStopped { cue: c, .. } if c == cue)
    }

    fn overlay_started(cue: &'static str) -> impl Fn(&SimEventKind) -> bool {
        move |k: &SimEventKind| matches!(k, SimEventKind::OverlayStarted { cue: c, .. } if c == cue)
    }

    #[test]
    fn custom_system_registration() {
        #[derive(Debug)]
        struct CustomSystem {
            ticked: bool,
        }
        impl System for CustomSystem {
            fn name(&self) -> &str {
                "custom"
            }
            fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
                self.ticked = true;
                Ok(())
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let mut sim = Simulation::new(world(), SimConfig::default());
        sim.add_system(CustomSystem { ticked: false });
        sim.run(1).unwrap();

        let custom = sim.get_system::<CustomSystem>().unwrap();
        assert!(custom.ticked);
        assert_eq!(sim.current_tick(), 1);
    }

    #[test]
    fn realtime_ticks_follow_the_wall_clock() {
        let mut sim = sim(quiet());
        let start = Instant::now();
        sim.tick_at(start, Vec::new()).unwrap();
        let first = sim.clock().hour();
        // The first tick uses the fixed timestep.
        assert!((first - (12.0 + sim.config().fixed_dt * 0.4)).abs() < 1e-4);

        sim.tick_at(start + Duration::from_secs(5), Vec::new()).unwrap();
        assert!((sim.clock().hour() - (first + 2.0)).abs() < 1e-3);
        assert_eq!(sim.current_tick(), 2);

        let hour = sim.clock().hour();
        sim.tick_at(start + Duration::from_secs(5), Vec::new()).unwrap();
        assert!((sim.clock().hour() - hour).abs() < f32::EPSILON);
        sim.tick_at(start, Vec::new()).unwrap();
        assert!((sim.clock().hour() - hour).abs() < f32::EPSILON);
        assert_eq!(sim.current_tick(), 4);
    }

    #[test]
    fn realtime_tick_applies_moves() {
        let mut sim = sim(quiet());
        let actor = sim.add_actor(Actor::new("hero", 1, 10, 10));
        sim.tick_realtime(vec![MoveRequest::step(actor, 1, 0)]).unwrap();
        sim.tick_realtime(Vec::new()).unwrap();
        assert_eq!(sim.current_tick(), 2);
        assert_eq!((sim.actors()[0].x, sim.actors()[0].y), (11, 10));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig::default().with_fixed_dt(-1.0);
        assert!(matches!(
            Simulation::with_default_systems(world(), config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn deterministic_rng() {
        let make_sim = || {
            let mut world = world();
            for x in 0..20 {
                world.grid.place(1, x, 3, 0, "dry_grass");
            }
            let config = SimConfig::default().with_seed(123).with_fire(FireConfig {
                ignition_chance: 0.01,
                ..FireConfig::default()
            });
            let mut sim = Simulation::with_default_systems(world, config).unwrap();
            sim.set_weather(Weather::Rain);
            sim.run(30).unwrap();
            sim.events()
                .events()
                .iter()
                .map(|e| e.description.clone())
                .collect::<Vec<_>>()
        };

        let run1 = make_sim();
        let run2 = make_sim();
        assert!(!run1.is_empty());
        assert_eq!(run1, run2);
    }

    #[test]
    fn rain_to_clear_within_one_tick() {
        let mut sim = sim(quiet());
        sim.set_weather(Weather::Rain);
        sim.run(1).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::Rain), 1);
        assert_eq!(at_tick(&sim, 1, overlay_started("rain_patter")), 1);

        sim.run(3).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::Rain), 1);
        assert_eq!(
            sim.events().count(overlay_started("rain_patter")),
            1,
            "overlay is edge-triggered"
        );

        sim.set_weather(Weather::Clear);
        sim.run(1).unwrap();
        assert!(sim.emitters().is_empty(EmitterKind::Rain));
        assert_eq!(at_tick(&sim, 5, overlay_stopped("rain_patter")), 1);
        assert_eq!(sim.get_system::<WeatherSystem>().unwrap().overlay(), None);
    }

    #[test]
    fn rain_to_snow_switches_overlays_directly() {
        let mut sim = sim(quiet());
        sim.set_weather(Weather::Rain);
        sim.run(2).unwrap();
        sim.set_weather(Weather::Snow);
        sim.run(1).unwrap();

        assert_eq!(at_tick(&sim, 3, overlay_stopped("rain_patter")), 1);
        assert_eq!(at_tick(&sim, 3, overlay_started("snow_wind")), 1);
        assert!(sim.emitters().is_empty(EmitterKind::Rain));
        assert_eq!(sim.emitters().len(EmitterKind::Snow), 1);
        assert!((sim.emitters().pool(EmitterKind::Snow)[0].intensity - 0.7).abs() < 1e-6);
        assert_eq!(
            sim.get_system::<WeatherSystem>().unwrap().overlay(),
            Some("snow_wind")
        );
    }

    #[test]
    fn rain_splashes_soak_sampled_ground_cells() {
        let config = quiet().with_weather(WeatherConfig {
            splash_chance: 1.0,
            lightning_chance: 0.0,
            ..WeatherConfig::default()
        });
        let mut sim = sim(config);
        sim.set_weather(Weather::Rain);
        sim.run(1).unwrap();

        let wet = &sim.environment().wetness;
        assert_eq!(wet.get(1, 0, 0), 1);
        assert_eq!(wet.get(1, 45, 10), 1);
        assert_eq!(wet.get(1, 1, 1), 0);
        assert_eq!(wet.get(0, 0, 0), 0);
        assert_eq!(wet.wet_cells(), 100);
        assert_eq!(sim.emitters().len(EmitterKind::Splash), 100);
        assert!(
            sim.emitters()
                .pool(EmitterKind::Splash)
                .iter()
                .all(|e| (3..=6).contains(&e.count))
        );
        assert_eq!(sim.get_system::<WeatherSystem>().unwrap().splashes(), 100);
    }

    #[test]
    fn wetness_evaporates_hourly_when_dry() {
        let mut sim = sim(quiet());
        sim.environment_mut().wetness.add(1, 4, 4, 3);
        // One in-game hour is 2.5 real seconds, 150 fixed ticks.
        sim.run(160).unwrap();
        assert_eq!(sim.environment().wetness.get(1, 4, 4), 2);
        assert_eq!(
            sim.events().count(|k| matches!(k, SimEventKind::Evaporated { .. })),
            1
        );
    }

    #[test]
    fn lightning_flashes_and_sparks() {
        let config = quiet().with_weather(WeatherConfig {
            lightning_chance: 1.0,
            ..WeatherConfig::default()
        });
        let mut sim = sim(config);
        sim.set_weather(Weather::Rain);
        sim.run(1).unwrap();

        assert!((sim.environment().flash_timer - 1.0).abs() < f32::EPSILON);
        assert_eq!(sim.emitters().len(EmitterKind::Spark), 1);
        assert_eq!(sim.emitters().pool(EmitterKind::Spark)[0].count, 100);
        assert_eq!(
            sim.events().count(|k| matches!(
                k,
                SimEventKind::SoundPlayed { cue, volume: 100, .. } if cue == "thunder"
            )),
            1
        );
        assert_eq!(sim.get_system::<LightningSystem>().unwrap().strikes(), 1);
    }

    #[test]
    fn no_lightning_without_rain() {
        let config = quiet().with_weather(WeatherConfig {
            lightning_chance: 1.0,
            ..WeatherConfig::default()
        });
        let mut sim = sim(config);
        sim.set_weather(Weather::Snow);
        sim.run(10).unwrap();
        assert_eq!(sim.get_system::<LightningSystem>().unwrap().strikes(), 0);
        assert_eq!(sim.environment().flash_timer, 0.0);
    }

    #[test]
    fn music_switches_once_per_crossing() {
        let mut sim = sim(quiet().with_start_hour(17.95));
        // 0.4 in-game minutes per tick: 600 ticks cover four hours.
        sim.run(600).unwrap();
        let crossfades: Vec<_> = sim
            .events()
            .events()
            .iter()
            .filter_map(|e| match &e.kind {
                SimEventKind::MusicCrossfade { from, to, fade_ms } => {
                    Some((from.clone(), to.clone(), *fade_ms))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            crossfades,
            vec![
                (None, "day_ambient".to_string(), 3000),
                (
                    Some("day_ambient".to_string()),
                    "night_ambient".to_string(),
                    3000
                ),
            ]
        );
    }

    #[test]
    fn morning_brings_day_music_back() {
        let mut sim = sim(quiet().with_start_hour(5.9));
        sim.run(100).unwrap();
        assert_eq!(
            sim.get_system::<DayNightSystem>().unwrap().track(),
            Some("day_ambient")
        );
        assert_eq!(
            sim.events().count(|k| matches!(k, SimEventKind::MusicCrossfade { .. })),
            2
        );
    }

    #[test]
    fn fire_burns_out_into_smoke_and_crackle_follows() {
        let config = SimConfig::default().with_fire(FireConfig {
            ignition_chance: 1.0,
            fire_lifetime: 0.1,
            ..FireConfig::default()
        });
        let mut world = World::new(catalog());
        world.grid.place(1, 10, 10, 0, "dry_grass");
        let mut sim = Simulation::with_default_systems(world, config).unwrap();

        sim.run(1).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::Fire), 1);
        assert!(sim.get_system::<FireSystem>().unwrap().is_crackling());
        assert_eq!(sim.events().count(overlay_started("fire_crackle")), 1);

        // The cell keeps burning; it is never ignited twice at once.
        sim.run(2).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::Fire), 1);
        assert_eq!(sim.get_system::<FireSystem>().unwrap().ignitions(), 1);

        // Remove the fuel and let the fire burn out.
        let pos = CellPos::new(1, 10, 10).unwrap();
        sim.world_mut().grid.clear_at(pos, 0);
        sim.run(10).unwrap();
        assert!(sim.emitters().is_empty(EmitterKind::Fire));
        assert_eq!(sim.emitters().len(EmitterKind::Smoke), 1);
        assert_eq!(sim.emitters().pool(EmitterKind::Smoke)[0].cell, Some(pos));
        assert!(sim.events().events_for_cell(pos).len() >= 4);
        assert_eq!(
            sim.events().count(|k| matches!(k, SimEventKind::BurnedOut { .. })),
            1
        );
        assert!(!sim.get_system::<FireSystem>().unwrap().is_crackling());
        assert_eq!(sim.events().count(overlay_stopped("fire_crackle")), 1);
    }

    #[test]
    fn burning_cells_neither_reignite_nor_catch_until_burned_out() {
        let config = SimConfig::default().with_fire(FireConfig {
            ignition_chance: 1.0,
            spread_chance: 1.0,
            fire_lifetime: 0.5,
            ..FireConfig::default()
        });
        let mut world = World::new(catalog());
        world.grid.place(1, 20, 20, 0, "dry_grass");
        world.grid.place(1, 20, 21, 0, "dry_grass");
        world.grid.place(1, 20, 22, 0, "dry_grass");
        let mut sim = Simulation::with_default_systems(world, config).unwrap();
        // Too wet to ignite on its own, so it can only catch from a neighbour.
        sim.environment_mut().wetness.add(1, 20, 22, 10);

        sim.run(20).unwrap();
        let fire = sim.get_system::<FireSystem>().unwrap();
        assert_eq!(fire.ignitions(), 3);
        assert_eq!(fire.spread_ignitions(), 1);
        assert_eq!(sim.emitters().len(EmitterKind::Fire), 3);

        // Once the first fires burn out the same cells go up again.
        sim.run(40).unwrap();
        let fire = sim.get_system::<FireSystem>().unwrap();
        assert_eq!(fire.ignitions(), 6);
        assert_eq!(fire.spread_ignitions(), 2);
        assert_eq!(
            sim.events().count(|k| matches!(k, SimEventKind::BurnedOut { .. })),
            3
        );
    }

    #[test]
    fn spread_count_survives_event_trimming() {
        let config = SimConfig::default().with_max_events(5).with_fire(FireConfig {
            ignition_chance: 1.0,
            spread_chance: 1.0,
            ..FireConfig::default()
        });
        let mut world = World::new(catalog());
        for x in 0..10 {
            world.grid.place(1, x, 0, 0, "dry_grass");
        }
        let mut sim = Simulation::with_default_systems(world, config).unwrap();
        for x in 1..10 {
            sim.environment_mut().wetness.add(1, x, 0, 10);
        }

        sim.run(1).unwrap();
        let fire = sim.get_system::<FireSystem>().unwrap();
        assert_eq!(fire.ignitions(), 10);
        assert_eq!(fire.spread_ignitions(), 9);
        assert!(sim.events().len() <= 5);
        assert!(
            sim.events()
                .count(|k| matches!(k, SimEventKind::Ignited { spread: true, .. }))
                < 9
        );
    }

    fn swamp() -> iso_core::BiomeMap {
        let elevation = vec![vec![0.5_f32; 50]; 50];
        let moisture = vec![vec![0.9_f32; 50]; 50];
        iso_core::BiomeMap::from_grids(&elevation, &moisture)
    }

    #[test]
    fn fog_follows_the_lead_actor_underground() {
        let mut world = World::new(Arc::new(TileCatalog::from_tiles([
            Tile::new("ladder_down", "bridge").with_connections([1]),
            Tile::new("ladder_up", "bridge").with_connections([2]),
        ])));
        world.grid.place(2, 25, 25, 0, "ladder_down");
        world.grid.place(1, 25, 25, 0, "ladder_up");
        world.biomes = swamp();
        let mut sim = Simulation::with_default_systems(world, quiet()).unwrap();
        let hero = sim.add_actor(Actor::new("hero", 2, 25, 25));

        // Noon above ground: clear.
        sim.run(1).unwrap();
        assert!(sim.emitters().is_empty(EmitterKind::Fog));

        let descend = TickInput {
            elapsed: 1.0 / 60.0,
            moves: vec![MoveRequest::down(hero)],
        };
        sim.tick(&descend).unwrap();
        assert_eq!(sim.actors()[hero].layer, 1);
        let fog = sim.emitters().pool(EmitterKind::Fog);
        assert_eq!(fog.len(), 1);
        assert!((fog[0].intensity - 1.5).abs() < 1e-6);

        // Exactly one fog emitter while the condition holds.
        sim.run(5).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::Fog), 1);

        let climb = TickInput {
            elapsed: 1.0 / 60.0,
            moves: vec![MoveRequest::up(hero)],
        };
        sim.tick(&climb).unwrap();
        assert_eq!(sim.actors()[hero].layer, 2);
        assert!(sim.emitters().is_empty(EmitterKind::Fog));
    }

    #[test]
    fn night_fog_on_the_surface() {
        let mut world = world();
        world.biomes = swamp();
        let mut sim =
            Simulation::with_default_systems(world, quiet().with_start_hour(22.0)).unwrap();
        sim.add_actor(Actor::new("hero", 2, 0, 0));
        sim.run(5).unwrap();
        let fog = sim.emitters().pool(EmitterKind::Fog);
        assert_eq!(fog.len(), 1);
        assert!((fog[0].intensity - 1.5).abs() < 1e-6);
        assert_eq!(fog[0].origin, iso_core::ScreenPoint::new(400.0, 300.0));
    }

    #[test]
    fn grass_sway_pool_is_capped() {
        let mut world = World::new(catalog());
        for pos in CellPos::iter_layer(1) {
            world.grid.place_at(pos, 0, "wispy");
        }
        let config = quiet().with_grass(GrassConfig {
            chance: 1.0,
            ..GrassConfig::default()
        });
        let mut sim = Simulation::with_default_systems(world, config).unwrap();
        sim.run(3).unwrap();
        assert_eq!(sim.emitters().len(EmitterKind::GrassSway), 64);
    }

    #[test]
    fn movement_plays_footsteps_only_when_it_succeeds() {
        let mut world = world();
        world.grid.place(1, 11, 10, 0, "boulder");
        let mut sim = Simulation::with_default_systems(world, quiet()).unwrap();
        let hero = sim.add_actor(Actor::new("hero", 1, 10, 10));

        sim.tick(&TickInput {
            elapsed: 1.0 / 60.0,
            moves: vec![MoveRequest::step(hero, 0, 1), MoveRequest::step(hero, 1, -1)],
        })
        .unwrap();
        assert_eq!((sim.actors()[0].x, sim.actors()[0].y), (10, 11));

        let steps: Vec<_> = sim
            .events()
            .events()
            .iter()
            .filter_map(|e| match &e.kind {
                SimEventKind::SoundPlayed { cue, volume, pan, .. } => {
                    Some((cue.clone(), *volume, *pan))
                }
                _ => None,
            })
            .collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].0, "footstep_terrain");
        assert_eq!(steps[0].1, 80);
        assert!((steps[0].2 + 0.3).abs() < 1e-6);
        assert_eq!(sim.events().events_for_actor(hero).len(), 2);
    }

    #[test]
    fn unknown_actor_is_skipped() {
        let mut sim = sim(quiet());
        sim.tick(&TickInput {
            elapsed: 1.0 / 60.0,
            moves: vec![MoveRequest::step(7, 1, 0)],
        })
        .unwrap();
        assert_eq!(sim.current_tick(), 1);
    }

    #[test]
    fn snapshot_reports_state() {
        let mut sim = sim(quiet());
        sim.set_weather(Weather::Snow);
        sim.run(2).unwrap();
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 2);
        assert_eq!(snap.weather, Weather::Snow);
        assert!(snap.emitters.contains(&(EmitterKind::Snow, 1)));
        assert_eq!(sim.ambient_tint(), [100, 100, 100]);
        assert_eq!(sim.light_sources(1).len(), 1);
    }

    #[test]
    fn weather_change_is_logged_once() {
        let mut sim = sim(quiet());
        sim.set_weather(Weather::Rain);
        sim.set_weather(Weather::Rain);
        assert_eq!(
            sim.events().count(|k| matches!(k, SimEventKind::WeatherChanged { .. })),
            1
        );
    }
}
