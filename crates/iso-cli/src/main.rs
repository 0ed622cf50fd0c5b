//! CLI frontend for the layered isometric world simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "iso",
    about = "Inspect and simulate layered isometric tile worlds",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a tile catalog and optional map, and report what was accepted
    Check {
        /// Tile catalog JSON file
        #[arg(short, long)]
        tiles: PathBuf,

        /// Map JSON file
        #[arg(short, long)]
        map: Option<PathBuf>,
    },

    /// Show the tile column at one cell and where it leads
    Inspect {
        /// Tile catalog JSON file
        #[arg(short, long)]
        tiles: PathBuf,

        /// Map JSON file
        #[arg(short, long)]
        map: PathBuf,

        /// Layer index (0-5)
        #[arg(short, long, default_value = "1")]
        layer: i32,

        /// Column
        #[arg(short, long)]
        x: i32,

        /// Row
        #[arg(short, long)]
        y: i32,

        /// Actor height used for passability
        #[arg(long, default_value = "1")]
        height: i32,
    },

    /// Run the environmental simulation over a map
    Simulate {
        /// Tile catalog JSON file
        #[arg(short, long)]
        tiles: PathBuf,

        /// Map JSON file
        #[arg(short, long)]
        map: PathBuf,

        /// Number of fixed ticks to run
        #[arg(short = 'n', long, default_value = "600")]
        ticks: u64,

        /// RNG seed, overriding the config file
        #[arg(short, long)]
        seed: Option<u64>,

        /// Weather for the run: clear, rain or snow
        #[arg(short, long, default_value = "clear")]
        weather: String,

        /// Simulation config JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
    {
        eprintln!("warning: logging unavailable: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { tiles, map } => commands::check::run(&tiles, map.as_deref()),
        Commands::Inspect {
            tiles,
            map,
            layer,
            x,
            y,
            height,
        } => commands::inspect::run(&tiles, &map, layer, x, y, height),
        Commands::Simulate {
            tiles,
            map,
            ticks,
            seed,
            weather,
            config,
        } => commands::simulate::run(
            &commands::simulate::SimulateArgs {
                tiles,
                map,
                ticks,
                seed,
                weather,
                config,
            },
            cli.verbose,
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
