use std::fmt;

use iso_core::{CellPos, GROUND_LAYER, TileGrid};

/// Something that walks the grid. Only its position matters to the
/// environment: footsteps and the fog check sample it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Display name.
    pub name: String,
    /// Vertical layer.
    pub layer: i32,
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
    /// Height compared against obstacle heights.
    pub height: i32,
}

impl Actor {
    /// An actor of height 1.
    pub fn new(name: impl Into<String>, layer: i32, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            layer,
            x,
            y,
            height: 1,
        }
    }

    /// Set the actor height.
    pub fn with_height(mut self, height: i32) -> Self {
        self.height = height;
        self
    }

    /// The actor's cell, if it stands on the grid.
    pub fn pos(&self) -> Option<CellPos> {
        CellPos::new(self.layer, self.x, self.y)
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::new("player", GROUND_LAYER as i32, 0, 0)
    }
}

/// A single movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Walk within the current layer.
    Step {
        /// Column delta.
        dx: i32,
        /// Row delta.
        dy: i32,
    },
    /// Climb one layer up through a connection.
    Up,
    /// Descend one layer through a connection.
    Down,
}

/// Movement input for one actor, supplied by the caller each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Index into the simulation's actor list.
    pub actor: usize,
    /// What to do.
    pub movement: Movement,
}

impl MoveRequest {
    /// A planar step.
    pub fn step(actor: usize, dx: i32, dy: i32) -> Self {
        Self {
            actor,
            movement: Movement::Step { dx, dy },
        }
    }

    /// Climb one layer.
    pub fn up(actor: usize) -> Self {
        Self {
            actor,
            movement: Movement::Up,
        }
    }

    /// Descend one layer.
    pub fn down(actor: usize) -> Self {
        Self {
            actor,
            movement: Movement::Down,
        }
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// The destination lies outside the grid.
    OutOfBounds,
    /// An impassable slot at least as tall as the actor.
    Obstacle,
    /// No bridge connects the layers here.
    NoConnection,
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::OutOfBounds => "out of bounds",
            Self::Obstacle => "obstacle",
            Self::NoConnection => "no connection",
        };
        f.write_str(reason)
    }
}

/// Apply a movement if the grid allows it. On success returns the cells
/// moved between; on refusal the actor is untouched.
pub fn apply_movement(
    grid: &TileGrid,
    actor: &mut Actor,
    movement: Movement,
) -> Result<(CellPos, CellPos), Blocked> {
    let from = actor.pos().ok_or(Blocked::OutOfBounds)?;
    let (layer, x, y) = match movement {
        Movement::Step { dx, dy } => (actor.layer, actor.x + dx, actor.y + dy),
        Movement::Up => (actor.layer + 1, actor.x, actor.y),
        Movement::Down => (actor.layer - 1, actor.x, actor.y),
    };
    let to = CellPos::new(layer, x, y).ok_or(match movement {
        Movement::Step { .. } => Blocked::OutOfBounds,
        Movement::Up | Movement::Down => Blocked::NoConnection,
    })?;
    if !grid.can_traverse(actor.layer, layer, x, y, actor.height) {
        return Err(if layer == actor.layer {
            Blocked::Obstacle
        } else {
            Blocked::NoConnection
        });
    }
    actor.layer = layer;
    actor.x = x;
    actor.y = y;
    Ok((from, to))
}

/// Footstep cue for whatever floor the actor stands on.
pub fn footstep_cue(grid: &TileGrid, actor: &Actor) -> Option<String> {
    let tile = grid.floor(actor.pos()?)?;
    Some(format!("footstep_{}", tile.kind))
}
