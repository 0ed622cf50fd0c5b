use std::collections::{HashSet, VecDeque};

use iso_core::{CellPos, TileGrid, WetnessMap};
use rand::Rng;
use tracing::debug;

use crate::config::FireConfig;
use crate::context::SimContext;
use crate::emitter::{Emitter, EmitterKind};
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

const CRACKLE_CUE: &str = "fire_crackle";

/// Per-tick chance that a flammable floor with `wetness` ignites.
pub fn ignition_chance(wetness: u8, config: &FireConfig) -> f64 {
    (config.ignition_chance * (1.0 - f64::from(wetness) / config.wetness_divisor)).max(0.0)
}

/// Sample spontaneous ignition over every cell of every layer.
///
/// A cell qualifies when its floor tile has any flammability; one random
/// draw is taken per qualifying cell.
pub fn ignition_pass(
    grid: &TileGrid,
    wetness: &WetnessMap,
    rng: &mut impl Rng,
    config: &FireConfig,
) -> Vec<CellPos> {
    CellPos::iter_all()
        .filter(|pos| {
            grid.floor(*pos).is_some_and(|tile| tile.flammability > 0)
                && rng.random::<f64>() < ignition_chance(wetness.at(*pos), config)
        })
        .collect()
}

/// Breadth-first spread from `seeds` through orthogonal neighbours in the
/// same layer.
///
/// A neighbour catches when its floor's flammability exceeds the threshold
/// and the spread roll succeeds. Seeds and cells for which `already_burning`
/// holds are never ignited again, and every cell is enqueued at most once,
/// so the returned list has no duplicates.
pub fn spread(
    grid: &TileGrid,
    seeds: &[CellPos],
    rng: &mut impl Rng,
    config: &FireConfig,
    already_burning: impl Fn(CellPos) -> bool,
) -> Vec<CellPos> {
    let mut visited: HashSet<CellPos> = seeds.iter().copied().collect();
    let mut queue: VecDeque<CellPos> = seeds.iter().copied().collect();
    let mut ignited = Vec::new();

    while let Some(cell) = queue.pop_front() {
        for next in cell.neighbors4() {
            if visited.contains(&next) || already_burning(next) {
                continue;
            }
            let catches = grid
                .floor(next)
                .is_some_and(|tile| tile.flammability > config.spread_threshold);
            if catches && rng.random::<f64>() < config.spread_chance {
                visited.insert(next);
                queue.push_back(next);
                ignited.push(next);
            }
        }
    }
    ignited
}

/// Ignites and spreads fire, and keeps the crackle overlay in step with the
/// fire pool.
#[derive(Debug, Default)]
pub struct FireSystem {
    crackling: bool,
    ignitions: u64,
    spread_ignitions: u64,
}

impl FireSystem {
    /// A system with no fire yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the crackle overlay is currently playing.
    pub fn is_crackling(&self) -> bool {
        self.crackling
    }

    /// Cells ignited since the start of the run.
    pub fn ignitions(&self) -> u64 {
        self.ignitions
    }

    /// How many of [`FireSystem::ignitions`] caught from a neighbour.
    pub fn spread_ignitions(&self) -> u64 {
        self.spread_ignitions
    }

    fn ignite(&mut self, ctx: &mut SimContext<'_>, cell: CellPos, spread: bool) {
        let lifetime = ctx.config.fire.fire_lifetime;
        ctx.spawn(Emitter::fire(cell, lifetime));
        let how = if spread { "spread to" } else { "ignited at" };
        ctx.emit(SimEventKind::Ignited { cell, spread }, format!("fire {how} {cell}"));
        self.ignitions += 1;
        if spread {
            self.spread_ignitions += 1;
        }
    }
}

impl System for FireSystem {
    fn name(&self) -> &str {
        "fire"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let config = ctx.config;
        let pools = &*ctx.emitters;

        // A cell keeps one fire emitter until it burns out: it neither
        // re-ignites nor catches spread while its emitter is alive.
        let seeds: Vec<CellPos> =
            ignition_pass(&ctx.world.grid, &ctx.env.wetness, ctx.rng, &config.fire)
                .into_iter()
                .filter(|cell| !pools.is_burning(*cell))
                .collect();
        let spread_to = spread(&ctx.world.grid, &seeds, ctx.rng, &config.fire, |cell| {
            pools.is_burning(cell)
        });

        if !seeds.is_empty() {
            debug!(
                tick = ctx.tick(),
                ignited = seeds.len(),
                spread = spread_to.len(),
                "fire pass"
            );
        }
        for cell in seeds {
            self.ignite(ctx, cell, false);
        }
        for cell in spread_to {
            self.ignite(ctx, cell, true);
        }

        let active = !ctx.emitters.is_empty(EmitterKind::Fire);
        if active != self.crackling {
            if active {
                ctx.start_overlay(CRACKLE_CUE, config.fire.crackle_volume);
            } else {
                ctx.stop_overlay(CRACKLE_CUE, config.weather.overlay_fade_ms);
            }
            self.crackling = active;
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use iso_core::{GRID_HEIGHT, GRID_WIDTH, Tile, TileCatalog};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn catalog() -> Arc<TileCatalog> {
        Arc::new(TileCatalog::from_tiles([
            Tile::new("dry_grass", "terrain").with_flammability(100),
            Tile::new("moss", "terrain").with_flammability(40),
            Tile::new("stone", "terrain"),
        ]))
    }

    fn certain() -> FireConfig {
        FireConfig {
            spread_chance: 1.0,
            ..FireConfig::default()
        }
    }

    fn cell(x: i32, y: i32) -> CellPos {
        CellPos::new(1, x, y).unwrap()
    }

    #[test]
    fn wetness_suppresses_ignition() {
        let config = FireConfig::default();
        assert!((ignition_chance(0, &config) - 0.1).abs() < 1e-12);
        assert!((ignition_chance(5, &config) - 0.05).abs() < 1e-12);
        assert_eq!(ignition_chance(10, &config), 0.0);
        assert_eq!(ignition_chance(20, &config), 0.0);
    }

    #[test]
    fn certain_spread_takes_the_whole_neighbourhood() {
        let mut grid = TileGrid::new(catalog());
        for (x, y) in [(10, 10), (10, 11), (11, 10), (10, 9), (9, 10)] {
            grid.place(1, x, y, 0, "dry_grass");
        }
        let mut rng = StdRng::seed_from_u64(1);
        let mut ignited = spread(&grid, &[cell(10, 10)], &mut rng, &certain(), |_| false);
        ignited.sort();
        let mut expected = vec![cell(10, 11), cell(11, 10), cell(10, 9), cell(9, 10)];
        expected.sort();
        assert_eq!(ignited, expected);
    }

    #[test]
    fn each_cell_ignites_at_most_once_per_pass() {
        let mut grid = TileGrid::new(catalog());
        for pos in CellPos::iter_layer(1) {
            grid.place_at(pos, 0, "dry_grass");
        }
        let mut rng = StdRng::seed_from_u64(2);
        let seeds = [cell(0, 0), cell(25, 25), cell(49, 49)];
        let ignited = spread(&grid, &seeds, &mut rng, &certain(), |_| false);
        let unique: HashSet<_> = ignited.iter().copied().collect();
        assert_eq!(unique.len(), ignited.len());
        assert_eq!(ignited.len(), GRID_WIDTH * GRID_HEIGHT - seeds.len());
        assert!(seeds.iter().all(|s| !unique.contains(s)));
    }

    #[test]
    fn low_flammability_neighbours_do_not_catch() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 5, 5, 0, "dry_grass");
        grid.place(1, 5, 6, 0, "moss");
        grid.place(1, 6, 5, 0, "stone");
        let mut rng = StdRng::seed_from_u64(3);
        assert!(spread(&grid, &[cell(5, 5)], &mut rng, &certain(), |_| false).is_empty());
    }

    #[test]
    fn burning_cells_are_skipped() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 3, 3, 0, "dry_grass");
        grid.place(1, 3, 4, 0, "dry_grass");
        grid.place(1, 3, 5, 0, "dry_grass");
        let mut rng = StdRng::seed_from_u64(4);
        let ignited = spread(&grid, &[cell(3, 3)], &mut rng, &certain(), |c| c == cell(3, 4));
        assert!(ignited.is_empty());
    }

    #[test]
    fn spread_stays_within_the_layer() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 7, 7, 0, "dry_grass");
        grid.place(2, 7, 7, 0, "dry_grass");
        grid.place(0, 7, 8, 0, "dry_grass");
        let mut rng = StdRng::seed_from_u64(5);
        assert!(spread(&grid, &[cell(7, 7)], &mut rng, &certain(), |_| false).is_empty());
    }

    #[test]
    fn ignition_only_on_flammable_floors() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 0, 0, 0, "stone");
        grid.place(3, 1, 1, 0, "moss");
        let config = FireConfig {
            ignition_chance: 1.0,
            ..FireConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(6);
        let ignited = ignition_pass(&grid, &WetnessMap::new(), &mut rng, &config);
        assert_eq!(ignited, vec![CellPos::new(3, 1, 1).unwrap()]);
    }

    #[test]
    fn soaked_cells_never_ignite() {
        let mut grid = TileGrid::new(catalog());
        grid.place(1, 0, 0, 0, "dry_grass");
        let mut wet = WetnessMap::new();
        wet.add(1, 0, 0, 10);
        let config = FireConfig {
            ignition_chance: 1.0,
            ..FireConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert!(ignition_pass(&grid, &wet, &mut rng, &config).is_empty());
    }
}
