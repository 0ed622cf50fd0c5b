pub mod check;
pub mod inspect;
pub mod simulate;

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use iso_core::{MapReport, TileCatalog, World};
use tracing::debug;

/// Load a catalog, failing when the file is unreadable or not a catalog.
/// Rejected entries are printed as warnings.
fn load_catalog(path: &Path) -> Result<Arc<TileCatalog>, String> {
    let catalog = TileCatalog::load(path)
        .map_err(|e| format!("cannot load tile catalog {}: {e}", path.display()))?;
    for reason in catalog.rejected() {
        eprintln!("  {} {reason}", "skipped".yellow());
    }
    Ok(Arc::new(catalog))
}

/// Load a catalog and a map into a fresh world.
fn load_world(tiles: &Path, map: &Path) -> Result<(World, MapReport), String> {
    let catalog = load_catalog(tiles)?;
    let mut world = World::new(catalog);
    let report = world
        .load_map(map)
        .map_err(|e| format!("cannot load map {}: {e}", map.display()))?;
    for skipped in &report.skipped_layers {
        eprintln!("  {} layer {skipped}", "skipped".yellow());
    }
    debug!(
        tiles = world.catalog().len(),
        placed = report.placed,
        dropped = report.dropped,
        "world loaded"
    );
    Ok((world, report))
}
