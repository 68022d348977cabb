//! Downslope world generator demo
//!
//! Runs a headless arcade world for a number of fixed ticks and prints a JSON
//! summary. Usage: `downslope-worldgen [seed] [ticks] [map.json]`

use downslope_worldgen::assets::AssetPack;
use downslope_worldgen::world::{SimContext, World, WorldEvent, WorldSummary};
use downslope_worldgen::{GenerationMode, GeneratorSettings, WeightedMapData, WorldGenError};

const DEFAULT_TICKS: u32 = 3000;
const DEMO_WORLD_SPEED: f32 = 0.1;

fn parse_arg<T: std::str::FromStr>(arg: Option<&String>, name: &str, default: T) -> Result<T, WorldGenError> {
    match arg {
        Some(raw) => raw
            .parse()
            .map_err(|_| WorldGenError::InvalidConfig(format!("invalid {}: '{}'", name, raw))),
        None => Ok(default),
    }
}

fn load_map(path: Option<&String>) -> Result<WeightedMapData, WorldGenError> {
    let Some(path) = path else {
        return Ok(WeightedMapData::standard_arcade());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| WorldGenError::InvalidConfig(format!("cannot read map '{}': {}", path, e)))?;
    WeightedMapData::from_json(&json)
}

fn run(args: &[String]) -> Result<WorldSummary, WorldGenError> {
    let mut settings = GeneratorSettings::from_mode(GenerationMode::Arcade);
    settings.obstacle_seed = parse_arg(args.get(1), "seed", settings.obstacle_seed)?;
    let ticks: u32 = parse_arg(args.get(2), "ticks", DEFAULT_TICKS)?;
    let map = load_map(args.get(3))?;

    log::info!(
        "Running {} ticks with seed {} on map '{}'",
        ticks,
        settings.obstacle_seed,
        map.name
    );

    let pack = AssetPack::standard();
    let mut world = World::new(settings)?;
    world.apply_map(&map);
    world.generate_next_batch(&pack, &pack);
    world.set_world_speed(DEMO_WORLD_SPEED);

    let ctx = SimContext::default();
    let player_x = 0.0f32;
    let mut camera_shifts = 0;
    for _ in 0..ticks {
        world.tick(&ctx, &pack, &pack, &player_x);
        camera_shifts += world
            .drain_events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::CameraShiftRequested(_)))
            .count();
    }
    log::debug!("{} camera shifts requested", camera_shifts);

    Ok(world.summary())
}

fn main() {
    env_logger::init();
    log::info!("Downslope world generator starting...");

    let args: Vec<String> = std::env::args().collect();
    let summary = match run(&args) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Failed to encode summary: {}", e);
            std::process::exit(1);
        }
    }
}
