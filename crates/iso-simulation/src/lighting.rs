//! Occluder and light-source enumeration for the renderer.
//!
//! Nothing here computes visibility; the renderer clips its own shadows
//! against the segments returned by [`occluders`].

use iso_core::{ScreenPoint, TileGrid, project};
use serde::Serialize;

use crate::clock::GameClock;
use crate::environment::Weather;

/// An opaque edge in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// Start point.
    pub start: ScreenPoint,
    /// End point.
    pub end: ScreenPoint,
}

/// A light the renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightSource {
    /// Screen position; `None` for global light such as the moon.
    pub origin: Option<ScreenPoint>,
    /// Reach in pixels.
    pub radius: i32,
    /// Brightness.
    pub intensity: i32,
    /// RGB colour.
    pub color: [u8; 3],
}

const MOON_RADIUS: i32 = 800;
const MOON_INTENSITY: i32 = 20;
const FULL_MOON_INTENSITY: i32 = 60;
const MOON_COLOR: [u8; 3] = [100, 150, 255];

/// Screen-space edges of every slot on a layer that blocks sight: opaque
/// levels, and every level of a tile marked `blocks_sight`.
///
/// Each slot's outline is offset from the projection of its cell raised to
/// the level's height. Slots referencing unknown tiles use the fallback
/// geometry, which is transparent.
pub fn occluders(grid: &TileGrid, layer: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (pos, height_level, _) in grid.occupied(layer) {
        let Some((tile, level)) = grid.level_at(pos, height_level) else {
            continue;
        };
        if level.transparent && !tile.blocks_sight {
            continue;
        }
        let base = project(pos.x as i32, pos.y as i32, level.height);
        segments.extend(level.segments().map(|(a, b)| Segment {
            start: base.offset(a.0 as f32, a.1 as f32),
            end: base.offset(b.0 as f32, b.1 as f32),
        }));
    }
    segments
}

/// The moon, brighter at full moon.
pub fn moonlight(clock: &GameClock) -> LightSource {
    LightSource {
        origin: None,
        radius: MOON_RADIUS,
        intensity: if clock.is_full_moon() {
            FULL_MOON_INTENSITY
        } else {
            MOON_INTENSITY
        },
        color: MOON_COLOR,
    }
}

/// Lights emitted by tiles on a layer, followed by the moon.
pub fn light_sources(grid: &TileGrid, layer: usize, clock: &GameClock) -> Vec<LightSource> {
    let mut lights: Vec<LightSource> = grid
        .occupied(layer)
        .filter_map(|(pos, height_level, _)| {
            let (tile, level) = grid.level_at(pos, height_level)?;
            let light = tile.emitted_light()?;
            Some(LightSource {
                origin: Some(project(pos.x as i32, pos.y as i32, level.height)),
                radius: light.radius,
                intensity: light.intensity,
                color: light.color,
            })
        })
        .collect();
    lights.push(moonlight(clock));
    lights
}

/// Global tint multiplied over the scene, per channel out of 100. Rain
/// dims it to 70%.
pub fn ambient_tint(clock: &GameClock, weather: Weather) -> [u8; 3] {
    let tint: [u8; 3] = if clock.is_night() {
        [50, 50, 100]
    } else {
        [100, 100, 100]
    };
    if weather == Weather::Rain {
        tint.map(|c| (u16::from(c) * 7 / 10) as u8)
    } else {
        tint
    }
}
