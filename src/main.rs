//! # Mapforge Command Line Entry Point
//!
//! Loads a room table, generates a map with the chosen driver, prints a
//! summary and optionally writes the map as JSON.

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use mapforge::{
    EditorGenerator, GeneratedMap, GenerationConfig, Generator, MapforgeError, MapforgeResult,
    RoomTable, RuntimeGenerator,
};
use std::path::PathBuf;

/// Which generation driver to run.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Restart the whole map until every constraint holds
    Runtime,
    /// Bounded search that may stop with a partial map
    Editor,
}

/// Command line arguments for mapforge.
#[derive(Parser, Debug)]
#[command(name = "mapforge")]
#[command(about = "Assembles dungeon maps from prefab rooms")]
#[command(version)]
struct Args {
    /// Room table as JSON; the built-in sample table is used when omitted
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Random seed for map generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of rooms to place
    #[arg(short, long)]
    rooms: Option<u32>,

    /// Generation driver
    #[arg(long, value_enum, default_value = "runtime")]
    mode: Mode,

    /// Allow rooms to be rotated so their doors line up
    #[arg(long)]
    rotate: bool,

    /// Write the generated map as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> MapforgeResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting mapforge v{}", mapforge::VERSION);

    let table = match &args.table {
        Some(path) => RoomTable::load(path)?,
        None => RoomTable::sample(),
    };

    let mut config = GenerationConfig::new(args.seed.unwrap_or_else(rand::random));
    if let Some(rooms) = args.rooms {
        config.room_count = rooms;
    }
    config.allow_rotation = args.rotate;

    let map = generate(&table, &config, args.mode)?;
    print_summary(&map, &config);

    if let Some(path) = &args.output {
        std::fs::write(path, map.to_json_string()?)?;
        info!("Wrote map to {}", path.display());
    }

    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> MapforgeResult<()> {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        other => {
            return Err(MapforgeError::InvalidConfig(format!(
                "unknown log level '{}'",
                other
            )))
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();

    Ok(())
}

/// Runs the selected driver with a generator seeded from the config.
fn generate(table: &RoomTable, config: &GenerationConfig, mode: Mode) -> MapforgeResult<GeneratedMap> {
    let mut rng = mapforge::generation::utils::create_rng(config);
    let generator: Box<dyn Generator<GeneratedMap> + '_> = match mode {
        Mode::Runtime => Box::new(RuntimeGenerator::new(table)),
        Mode::Editor => Box::new(EditorGenerator::new(table)),
    };

    info!(
        "Generating {} rooms with {} (seed {})",
        config.room_count,
        generator.generator_type(),
        config.seed
    );
    let map = generator.generate(config, &mut rng)?;

    if map.complete {
        generator.validate(&map, config)?;
    }
    Ok(map)
}

fn print_summary(map: &GeneratedMap, config: &GenerationConfig) {
    let status = if map.complete { "complete" } else { "partial" };
    println!(
        "Map {} ({} of {} rooms, {} restarts, {} steps, {} substitutions)",
        status,
        map.rooms.len(),
        config.room_count,
        map.report.restarts,
        map.report.steps,
        map.report.substitutions
    );

    for room in &map.rooms {
        let position = room.transform.translation;
        println!(
            "  #{:<3} {:<16} at ({:>7.2}, {:>7.2}, {:>7.2}) yaw {:>4.0}°{}",
            room.id,
            room.name,
            position.x,
            position.y,
            position.z,
            room.transform.yaw.to_degrees(),
            if room.teleported { "  teleported" } else { "" }
        );
    }

    if let (Some(first), Some(last)) = (map.rooms.first(), map.rooms.last()) {
        if let Some(path) = map.path_between(first.id, last.id) {
            println!("Path from first to last room crosses {} rooms", path.len());
        }
    }
}
