use crate::config::ClockConfig;

/// What changed during one clock advance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockStep {
    /// In-game hours that passed.
    pub hours: f32,
    /// Midnights crossed, each of which advanced the moon.
    pub days: u64,
}

/// Tracks simulation time: a monotonic tick counter, the hour of day and
/// the moon phase.
///
/// Hour and moon are both driven by the same elapsed-time accumulator, so
/// the moon advances once per in-game day regardless of frame rate.
#[derive(Debug, Clone)]
pub struct GameClock {
    tick: u64,
    hour: f32,
    elapsed: f32,
    day: u64,
    moon_phase: u8,
    moon_cycle: u8,
    hours_per_second: f32,
}

impl GameClock {
    /// Create a clock at tick 0 and the configured start hour.
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            tick: 0,
            hour: config.start_hour.rem_euclid(24.0),
            elapsed: 0.0,
            day: 0,
            moon_phase: 0,
            moon_cycle: config.moon_cycle.max(1),
            hours_per_second: config.game_hours_per_real_minute / 60.0,
        }
    }

    /// Start a new tick. Returns the new tick number.
    pub fn begin_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Advance by `dt` real seconds. Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, dt: f32) -> ClockStep {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        let hours = dt * self.hours_per_second;
        self.hour += hours;

        let days = (self.hour / 24.0).floor() as u64;
        if days > 0 {
            self.hour = self.hour.rem_euclid(24.0);
            if self.hour >= 24.0 {
                self.hour = 0.0;
            }
            self.day += days;
            let cycle = u64::from(self.moon_cycle);
            self.moon_phase = ((u64::from(self.moon_phase) + days % cycle) % cycle) as u8;
        }
        ClockStep { hours, days }
    }

    /// Current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Hour of day in `[0, 24)`.
    pub fn hour(&self) -> f32 {
        self.hour
    }

    /// Real seconds since the simulation began, used for tile animation.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }

    /// Completed in-game days.
    pub fn day(&self) -> u64 {
        self.day
    }

    /// Moon phase in `0..moon_cycle`.
    pub fn moon_phase(&self) -> u8 {
        self.moon_phase
    }

    /// Whether the moon is at the middle of its cycle.
    pub fn is_full_moon(&self) -> bool {
        self.moon_phase == self.moon_cycle / 2
    }

    /// Night is before 06:00 or after 18:00.
    pub fn is_night(&self) -> bool {
        self.hour < 6.0 || self.hour > 18.0
    }

    /// Fog rises before 04:00 and from 20:00.
    pub fn is_foggy_hour(&self) -> bool {
        self.hour < 4.0 || self.hour >= 20.0
    }
}
