use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use iso_simulation::daynight::DayNightSystem;
use iso_simulation::fire::FireSystem;
use iso_simulation::lightning::LightningSystem;
use iso_simulation::weather::WeatherSystem;
use iso_simulation::{EmitterKind, SimConfig, SimEventKind, Simulation, Weather};

/// Inputs for one `simulate` run.
pub struct SimulateArgs {
    pub tiles: PathBuf,
    pub map: PathBuf,
    pub ticks: u64,
    pub seed: Option<u64>,
    pub weather: String,
    pub config: Option<PathBuf>,
}

pub fn run(args: &SimulateArgs, verbose: bool) -> Result<(), String> {
    let weather: Weather = args.weather.parse()?;
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path).map_err(|e| e.to_string())?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let seed = config.seed;

    let (world, report) = super::load_world(&args.tiles, &args.map)?;
    let mut sim = Simulation::with_default_systems(world, config)
        .map_err(|e| format!("simulation setup failed: {e}"))?;
    sim.set_weather(weather);
    sim.run(args.ticks)
        .map_err(|e| format!("simulation error: {e}"))?;

    // Header
    let clock = sim.clock();
    let hour = clock.hour();
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!(
            "({} ticks, seed={seed}, weather={weather}, {} placements)",
            args.ticks, report.placed
        )
        .dimmed()
    );
    println!(
        "  Day {}, {:02}:{:02}, moon phase {}{}",
        clock.day(),
        hour as u32,
        (hour.fract() * 60.0) as u32,
        clock.moon_phase(),
        if clock.is_full_moon() { " (full)" } else { "" }
    );
    println!("  {} events logged", sim.events().len());
    println!();

    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[tick {:>4}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    // Activity
    println!("  {}", "Activity".bold().underline());
    println!();
    let (ignitions, spread) = sim
        .get_system::<FireSystem>()
        .map_or((0, 0), |fire| (fire.ignitions(), fire.spread_ignitions()));
    let splashes = sim.get_system::<WeatherSystem>().map_or(0, WeatherSystem::splashes);
    let strikes = sim.get_system::<LightningSystem>().map_or(0, LightningSystem::strikes);
    let wetness = &sim.environment().wetness;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Measure", "Value"]);
    table.add_row(vec!["Ignitions".to_string(), format!("{ignitions} ({spread} by spread)")]);
    table.add_row(vec!["Rain splashes".to_string(), splashes.to_string()]);
    table.add_row(vec!["Lightning strikes".to_string(), strikes.to_string()]);
    table.add_row(vec![
        "Wet cells".to_string(),
        format!("{} (total {})", wetness.wet_cells(), wetness.total()),
    ]);
    table.add_row(vec![
        "Overlay".to_string(),
        sim.get_system::<WeatherSystem>()
            .and_then(WeatherSystem::overlay)
            .unwrap_or("none")
            .to_string(),
    ]);
    table.add_row(vec![
        "Fire crackle".to_string(),
        if sim.get_system::<FireSystem>().is_some_and(FireSystem::is_crackling) {
            "playing".to_string()
        } else {
            "silent".to_string()
        },
    ]);
    table.add_row(vec![
        "Music".to_string(),
        sim.get_system::<DayNightSystem>()
            .and_then(DayNightSystem::track)
            .unwrap_or("none")
            .to_string(),
    ]);
    println!("{table}");
    println!();

    // Emitter pools
    println!("  {}", "Emitters".bold().underline());
    println!();
    let mut pools = Table::new();
    pools.set_content_arrangement(ContentArrangement::Dynamic);
    pools.set_header(vec!["Kind", "Active"]);
    for kind in EmitterKind::ALL {
        let count = sim.emitters().len(kind);
        let cell = if count == 0 {
            "0".dimmed().to_string()
        } else {
            count.to_string()
        };
        pools.add_row(vec![kind.to_string(), cell]);
    }
    println!("{pools}");
    println!();

    Ok(())
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::Ignited { .. } => description.red().bold(),
        SimEventKind::BurnedOut { .. } => description.red(),
        SimEventKind::LightningStrike { .. } => description.yellow().bold(),
        SimEventKind::WeatherChanged { .. } | SimEventKind::Evaporated { .. } => {
            description.blue()
        }
        SimEventKind::MusicCrossfade { .. }
        | SimEventKind::OverlayStarted { .. }
        | SimEventKind::OverlayStopped { .. }
        | SimEventKind::SoundPlayed { .. } => description.cyan(),
        SimEventKind::ActorMoved { .. } => description.green(),
        SimEventKind::MoveBlocked { .. } => description.yellow(),
        SimEventKind::EmitterSpawned { .. } | SimEventKind::EmitterCleared { .. } => {
            description.dimmed()
        }
    }
}
