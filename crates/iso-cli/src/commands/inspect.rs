use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use iso_core::{CellPos, LAYER_COUNT};

pub fn run(tiles: &Path, map: &Path, layer: i32, x: i32, y: i32, height: i32) -> Result<(), String> {
    let (world, _) = super::load_world(tiles, map)?;
    let pos = CellPos::new(layer, x, y)
        .ok_or_else(|| format!("cell ({layer}, {x}, {y}) is outside the grid"))?;
    let grid = &world.grid;

    let screen = pos.screen();
    println!(
        "  {} {}",
        "Cell".bold(),
        format!("{pos}  screen ({:.0}, {:.0})  biome {}", screen.x, screen.y, world.biomes.biome_at(pos))
            .dimmed()
    );
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Level", "Tile", "Type", "Height", "Passable", "Transparent"]);
    let mut empty = true;
    for (level, id) in grid.column(pos) {
        empty = false;
        let known = grid.catalog().get(id).is_some();
        let name = if known {
            id.to_string()
        } else {
            format!("{id} {}", "(unknown)".red())
        };
        let row = match grid.level_at(pos, level) {
            Some((tile, slot)) => vec![
                level.to_string(),
                name,
                tile.kind.clone(),
                slot.height.to_string(),
                yes_no(slot.passable),
                yes_no(slot.transparent),
            ],
            None => vec![
                level.to_string(),
                name,
                "--".into(),
                "--".into(),
                "--".into(),
                "--".into(),
            ],
        };
        table.add_row(row);
    }
    if empty {
        println!("  {}", "(empty cell)".dimmed());
    } else {
        println!("{table}");
    }
    println!();

    println!(
        "  Furniture support: {}",
        yes_no(grid.supports_furniture(layer, x, y))
    );

    let reachable: Vec<String> = (0..LAYER_COUNT as i32)
        .filter(|to| grid.can_traverse(layer, *to, x, y, height))
        .map(|to| {
            if to == layer {
                format!("{to} (walkable at height {height})")
            } else {
                to.to_string()
            }
        })
        .collect();
    if reachable.is_empty() {
        println!("  Reachable layers: {}", "none".yellow());
    } else {
        println!("  Reachable layers: {}", reachable.join(", "));
    }
    Ok(())
}

fn yes_no(value: bool) -> String {
    if value { "yes".into() } else { "no".into() }
}
