use std::path::Path;

use colored::Colorize;
use iso_core::World;

pub fn run(tiles: &Path, map: Option<&Path>) -> Result<(), String> {
    let catalog = super::load_catalog(tiles)?;
    let rejected = catalog.rejected().len();
    let lights = catalog.lights().len();
    let bridges = catalog.iter().filter(|t| t.is_bridge()).count();

    println!(
        "  {} tiles loaded, {} rejected",
        catalog.len(),
        if rejected == 0 {
            rejected.to_string().normal()
        } else {
            rejected.to_string().yellow()
        }
    );
    println!("  {lights} light source(s), {bridges} bridge(s)");

    let Some(map) = map else {
        println!("  {}", "Catalog OK.".green());
        return Ok(());
    };

    let mut world = World::new(catalog);
    let report = world
        .load_map(map)
        .map_err(|e| format!("cannot load map {}: {e}", map.display()))?;

    println!(
        "  {} placements, {} dropped, {} layer(s) skipped",
        report.placed,
        report.dropped,
        report.skipped_layers.len()
    );
    for skipped in &report.skipped_layers {
        println!("    {} {skipped}", "-".dimmed());
    }
    let unknown: usize = (0..iso_core::LAYER_COUNT)
        .map(|layer| {
            world
                .grid
                .occupied(layer)
                .filter(|(_, _, id)| world.catalog().get(id).is_none())
                .count()
        })
        .sum();
    if unknown > 0 {
        println!(
            "  {} {unknown} placement(s) reference unknown tiles",
            "warning:".yellow()
        );
    }
    let off_layer: usize = (0..iso_core::LAYER_COUNT)
        .map(|layer| {
            world
                .grid
                .occupied(layer)
                .filter(|(_, _, id)| {
                    world
                        .catalog()
                        .get(id)
                        .is_some_and(|tile| tile.preferred_layer != layer)
                })
                .count()
        })
        .sum();
    if off_layer > 0 {
        println!("  {off_layer} placement(s) outside their preferred layer");
    }
    println!(
        "  biomes: {}",
        if report.has_biomes { "yes" } else { "none" }
    );
    println!("  {}", "All checks passed.".green());
    Ok(())
}
