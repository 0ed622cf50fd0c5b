//! Property tests for placement, traversal and wetness invariants.

use std::sync::Arc;

use iso_core::{
    GRID_HEIGHT, GRID_WIDTH, HeightLevel, LAYER_COUNT, MAX_HEIGHT_LEVELS, MAX_WETNESS, Tile,
    TileCatalog, TileGrid, WetnessMap,
};
use proptest::prelude::*;

const IDS: [&str; 5] = ["grass", "boulder", "tree", "bridge_up", "bridge_down"];

fn catalog() -> Arc<TileCatalog> {
    Arc::new(TileCatalog::from_tiles([
        Tile::new("grass", "terrain"),
        Tile::new("boulder", "terrain").with_levels(vec![HeightLevel::solid(0)]),
        Tile::new("tree", "terrain").with_levels(vec![
            HeightLevel::solid(0),
            HeightLevel::solid(1),
            HeightLevel::open(2),
        ]),
        Tile::new("bridge_up", "bridge").with_connections([2]),
        Tile::new("bridge_down", "bridge").with_connections([0]),
    ]))
}

fn in_bounds() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    (
        0..LAYER_COUNT as i32,
        0..GRID_WIDTH as i32,
        0..GRID_HEIGHT as i32,
        0..MAX_HEIGHT_LEVELS as i32,
    )
}

fn out_of_bounds() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    prop_oneof![
        (LAYER_COUNT as i32..100, 0..50, 0..50, 0..3),
        (-100..0, 0..50, 0..50, 0..3),
        (0..6, GRID_WIDTH as i32..200, 0..50, 0..3),
        (0..6, 0..50, -200..0, 0..3),
        (0..6, 0..50, 0..50, MAX_HEIGHT_LEVELS as i32..10),
        (0..6, 0..50, 0..50, -10..0),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_place_then_lookup_round_trips((layer, x, y, h) in in_bounds(), id in 0..IDS.len()) {
        let mut grid = TileGrid::new(catalog());
        prop_assert!(grid.place(layer, x, y, h, IDS[id]));
        let found = grid.tile_at(layer, x, y, h);
        prop_assert_eq!(found.map(|r| r.id), Some(IDS[id]));
    }

    #[test]
    fn prop_out_of_bounds_place_is_noop(
        (layer, x, y, h) in out_of_bounds(),
        probe in in_bounds(),
    ) {
        let mut grid = TileGrid::new(catalog());
        grid.place(probe.0, probe.1, probe.2, probe.3, "grass");
        prop_assert!(!grid.place(layer, x, y, h, "boulder"));
        prop_assert_eq!(grid.placement_count(), 1);
        prop_assert_eq!(grid.tile_id_at(probe.0, probe.1, probe.2, probe.3), Some("grass"));
    }

    #[test]
    fn prop_same_layer_traversal_matches_blocking_rule(
        x in 0..GRID_WIDTH as i32,
        y in 0..GRID_HEIGHT as i32,
        stack in proptest::collection::vec(proptest::option::of(0..3usize), 3),
        actor_height in 0..4i32,
    ) {
        let mut grid = TileGrid::new(catalog());
        let catalog = catalog();
        let mut blocked = false;
        for (level, choice) in stack.iter().enumerate() {
            if let Some(choice) = choice {
                let id = IDS[*choice];
                grid.place(1, x, y, level as i32, id);
                if let Some(lev) = catalog.get(id).and_then(|t| t.level(level)) {
                    if !lev.passable && actor_height <= lev.height {
                        blocked = true;
                    }
                }
            }
        }
        prop_assert_eq!(grid.can_traverse(1, 1, x, y, actor_height), !blocked);
    }

    #[test]
    fn prop_empty_column_always_traversable(
        layer in 0..LAYER_COUNT as i32,
        x in 0..GRID_WIDTH as i32,
        y in 0..GRID_HEIGHT as i32,
        actor_height in -5..5i32,
    ) {
        let grid = TileGrid::new(catalog());
        prop_assert!(grid.can_traverse(layer, layer, x, y, actor_height));
    }

    #[test]
    fn prop_cross_layer_only_along_declared_direction(
        from in 0..LAYER_COUNT as i32,
        to in 0..LAYER_COUNT as i32,
        floor in 0..IDS.len(),
    ) {
        prop_assume!(from != to);
        let mut grid = TileGrid::new(catalog());
        grid.place(from, 10, 10, 0, IDS[floor]);
        let expected = match IDS[floor] {
            "bridge_up" => to == 2,
            "bridge_down" => to == 0,
            _ => false,
        };
        prop_assert_eq!(grid.can_traverse(from, to, 10, 10, 1), expected);
        // The destination cell's declarations never grant the move.
        let mut reverse = TileGrid::new(catalog());
        reverse.place(to, 10, 10, 0, IDS[floor]);
        prop_assert!(!reverse.can_traverse(from, to, 10, 10, 1));
    }

    #[test]
    fn prop_wetness_stays_in_range(amounts in proptest::collection::vec(-30..30i32, 0..200)) {
        let mut wet = WetnessMap::new();
        for amount in amounts {
            wet.add(1, 7, 7, amount);
            let value = wet.get(1, 7, 7);
            prop_assert!(value <= MAX_WETNESS);
        }
    }

    #[test]
    fn prop_repeated_additions_saturate(n in 0..500usize) {
        let mut wet = WetnessMap::new();
        for _ in 0..n {
            wet.add(1, 0, 0, 1);
        }
        prop_assert_eq!(wet.get(1, 0, 0) as usize, n.min(MAX_WETNESS as usize));
    }
}
