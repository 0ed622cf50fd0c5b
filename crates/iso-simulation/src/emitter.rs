use std::fmt;

use iso_core::{CellPos, ScreenPoint};
use serde::Serialize;

/// Effect type of a particle emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterKind {
    /// Flames over a burning cell.
    Fire,
    /// Smoke left behind once a fire burns out.
    Smoke,
    /// Screen-wide rain streaks.
    Rain,
    /// Screen-wide snowfall.
    Snow,
    /// Droplets where rain hits the ground.
    Splash,
    /// Lightning sparks.
    Spark,
    /// Low-lying fog bank.
    Fog,
    /// Blades of grass moving in the wind.
    GrassSway,
}

impl EmitterKind {
    /// Every kind, in pool order.
    pub const ALL: [Self; 8] = [
        Self::Fire,
        Self::Smoke,
        Self::Rain,
        Self::Snow,
        Self::Splash,
        Self::Spark,
        Self::Fog,
        Self::GrassSway,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Particles per second a continuous emitter of intensity 1 spawns.
    /// Burst emitters spawn their whole `count` once and report 0.
    pub fn spawn_rate(self) -> f32 {
        match self {
            Self::Fire => 20.0,
            Self::Smoke => 15.0,
            Self::Rain => 200.0,
            Self::Snow => 100.0,
            Self::Fog => 5.0,
            Self::Splash | Self::Spark | Self::GrassSway => 0.0,
        }
    }

    /// How strongly wind pushes this effect's particles.
    pub fn wind_response(self) -> f32 {
        match self {
            Self::Smoke | Self::Rain | Self::Snow | Self::GrassSway => 1.0,
            Self::Fire | Self::Splash | Self::Spark | Self::Fog => 0.0,
        }
    }
}

impl fmt::Display for EmitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fire => "fire",
            Self::Smoke => "smoke",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Splash => "splash",
            Self::Spark => "spark",
            Self::Fog => "fog",
            Self::GrassSway => "grass_sway",
        };
        f.write_str(name)
    }
}

/// Shared conditions every emitter advances under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ambient {
    /// Horizontal wind, `[-1, 1]`.
    pub wind: f32,
    /// Global multiplier on spawn rates.
    pub intensity: f32,
}

impl Default for Ambient {
    fn default() -> Self {
        Self {
            wind: 0.0,
            intensity: 1.0,
        }
    }
}

/// One active particle-effect instance.
///
/// The core decides when an emitter exists; per-particle physics belongs to
/// the renderer, which reads [`Emitter::describe_for_render`].
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    /// Effect type.
    pub kind: EmitterKind,
    /// Screen-space origin.
    pub origin: ScreenPoint,
    /// Effect strength.
    pub intensity: f32,
    /// Particle count for burst effects.
    pub count: u32,
    /// Seconds alive.
    pub age: f32,
    /// Seconds until expiry; `None` persists until its condition clears.
    pub lifetime: Option<f32>,
    /// Grid cell the effect belongs to, when it has one.
    pub cell: Option<CellPos>,
    wind: f32,
    rate_scale: f32,
}

impl Emitter {
    fn new(kind: EmitterKind, origin: ScreenPoint) -> Self {
        Self {
            kind,
            origin,
            intensity: 1.0,
            count: 0,
            age: 0.0,
            lifetime: None,
            cell: None,
            wind: 0.0,
            rate_scale: 1.0,
        }
    }

    /// Flames over a burning cell.
    pub fn fire(cell: CellPos, lifetime: f32) -> Self {
        Self {
            cell: Some(cell),
            lifetime: Some(lifetime),
            ..Self::new(EmitterKind::Fire, cell.screen())
        }
    }

    /// Smoke rising where a fire was.
    pub fn smoke(origin: ScreenPoint, cell: Option<CellPos>, lifetime: f32) -> Self {
        Self {
            cell,
            lifetime: Some(lifetime),
            ..Self::new(EmitterKind::Smoke, origin)
        }
    }

    /// Rain over a screen of `width x height` pixels.
    pub fn rain(width: f32, height: f32, intensity: f32) -> Self {
        Self {
            intensity,
            ..Self::new(EmitterKind::Rain, ScreenPoint::new(width, height))
        }
    }

    /// Snow over a screen of `width x height` pixels.
    pub fn snow(width: f32, height: f32, intensity: f32) -> Self {
        Self {
            intensity,
            ..Self::new(EmitterKind::Snow, ScreenPoint::new(width, height))
        }
    }

    /// A burst of droplets.
    pub fn splash(cell: CellPos, count: u32) -> Self {
        Self {
            cell: Some(cell),
            count,
            lifetime: Some(0.5),
            ..Self::new(EmitterKind::Splash, cell.screen())
        }
    }

    /// A burst of lightning sparks.
    pub fn spark(cell: CellPos, count: u32) -> Self {
        Self {
            cell: Some(cell),
            count,
            lifetime: Some(1.0),
            ..Self::new(EmitterKind::Spark, cell.screen())
        }
    }

    /// A fog bank.
    pub fn fog(origin: ScreenPoint, intensity: f32) -> Self {
        Self {
            intensity,
            ..Self::new(EmitterKind::Fog, origin)
        }
    }

    /// Blades of grass swaying over a cell.
    pub fn grass(cell: CellPos, blades: u32, lifetime: f32) -> Self {
        Self {
            cell: Some(cell),
            count: blades,
            lifetime: Some(lifetime),
            ..Self::new(EmitterKind::GrassSway, cell.screen())
        }
    }

    /// Age by `dt` seconds under `ambient`. Returns whether still alive.
    pub fn advance(&mut self, dt: f32, ambient: &Ambient) -> bool {
        self.age += dt.max(0.0);
        self.wind = ambient.wind * self.kind.wind_response();
        self.rate_scale = ambient.intensity;
        self.is_alive()
    }

    /// Whether the lifetime has not yet run out.
    pub fn is_alive(&self) -> bool {
        self.lifetime.is_none_or(|life| self.age < life)
    }

    /// Everything a renderer needs to drive this effect.
    pub fn describe_for_render(&self) -> EmitterView {
        EmitterView {
            kind: self.kind,
            origin: self.origin,
            intensity: self.intensity,
            count: self.count,
            spawn_rate: self.kind.spawn_rate() * self.intensity * self.rate_scale,
            wind: self.wind,
            remaining: self.lifetime.map(|life| (life - self.age).max(0.0)),
        }
    }
}

/// Render-facing snapshot of an emitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitterView {
    /// Effect type.
    pub kind: EmitterKind,
    /// Screen-space origin.
    pub origin: ScreenPoint,
    /// Effect strength.
    pub intensity: f32,
    /// Particle count for burst effects.
    pub count: u32,
    /// Particles per second for continuous effects.
    pub spawn_rate: f32,
    /// Wind acting on the particles.
    pub wind: f32,
    /// Seconds left, for finite effects.
    pub remaining: Option<f32>,
}

/// One ordered pool of emitters per [`EmitterKind`].
#[derive(Debug, Clone, Default)]
pub struct EmitterPools {
    pools: [Vec<Emitter>; EmitterKind::ALL.len()],
}

impl EmitterPools {
    /// All pools empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active emitters of one kind, oldest first.
    pub fn pool(&self, kind: EmitterKind) -> &[Emitter] {
        &self.pools[kind.index()]
    }

    /// Number of active emitters of one kind.
    pub fn len(&self, kind: EmitterKind) -> usize {
        self.pools[kind.index()].len()
    }

    /// Whether no emitter of `kind` is active.
    pub fn is_empty(&self, kind: EmitterKind) -> bool {
        self.pools[kind.index()].is_empty()
    }

    /// Active emitters across every pool.
    pub fn total(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }

    /// Add an emitter to the back of its pool.
    pub fn push(&mut self, emitter: Emitter) {
        self.pools[emitter.kind.index()].push(emitter);
    }

    /// Add an emitter, evicting the oldest ones of its kind beyond `cap`.
    /// Returns how many were evicted.
    pub fn push_capped(&mut self, emitter: Emitter, cap: usize) -> usize {
        let pool = &mut self.pools[emitter.kind.index()];
        pool.push(emitter);
        let excess = pool.len().saturating_sub(cap.max(1));
        pool.drain(..excess);
        excess
    }

    /// Remove every emitter of `kind`. Returns how many there were.
    pub fn clear(&mut self, kind: EmitterKind) -> usize {
        let pool = &mut self.pools[kind.index()];
        let count = pool.len();
        pool.clear();
        count
    }

    /// Whether a fire emitter is already burning at `cell`.
    pub fn is_burning(&self, cell: CellPos) -> bool {
        self.pool(EmitterKind::Fire)
            .iter()
            .any(|e| e.cell == Some(cell))
    }

    /// Advance every emitter and remove the expired ones, which are returned
    /// in pool order.
    pub fn advance(&mut self, dt: f32, ambient: &Ambient) -> Vec<Emitter> {
        let mut expired = Vec::new();
        for pool in &mut self.pools {
            let mut alive = Vec::with_capacity(pool.len());
            for mut emitter in pool.drain(..) {
                if emitter.advance(dt, ambient) {
                    alive.push(emitter);
                } else {
                    expired.push(emitter);
                }
            }
            *pool = alive;
        }
        expired
    }

    /// Render views of every active emitter.
    pub fn views(&self) -> Vec<EmitterView> {
        self.pools
            .iter()
            .flatten()
            .map(Emitter::describe_for_render)
            .collect()
    }
}
