use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glam::Vec2;
use scrapyard_common::{Category, ChunkCoord, Rect, TrackedEntity};
use scrapyard_kernel::World;
use scrapyard_procgen::{ChunkGenerator, GenContext, HeightField, find_spawn_point};
use scrapyard_stream::{ScrapyardConfig, StreamInputs, StreamManager};
use scrapyard_tools::StreamInspector;
use tracing_subscriber::EnvFilter;

/// Thickness of the boundary wall slabs spawned around the world.
const WALL_THICKNESS: f32 = 64.0;

#[derive(Parser)]
#[command(name = "scrapyard-cli", about = "CLI for scrapyard arena generation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (.json, .yaml or .yml); defaults apply otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective configuration
    Info,
    /// Generate one chunk into an empty walled world and print its plan
    Generate {
        /// Override the configured world seed
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        cx: i32,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        cy: i32,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate a viewer sweeping across the world
    Stream {
        #[arg(short, long, default_value = "600")]
        ticks: u32,
        /// Viewer speed in world units per second
        #[arg(long, default_value = "1200")]
        speed: f32,
        /// Log a progress line every this many ticks
        #[arg(long, default_value = "60")]
        report_every: u32,
    },
    /// Stream in the area around a point and print the ground there
    Height {
        #[arg(long, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, allow_hyphen_values = true)]
        y: f32,
    },
    /// Stream in an area and search it for a clear spawn point
    SpawnPoint {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: f32,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        y: f32,
        /// Edge length of the square search area
        #[arg(long, default_value = "2048")]
        size: f32,
        #[arg(long, default_value = "48")]
        radius: f32,
        #[arg(long, default_value = "64")]
        attempts: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ScrapyardConfig::load(path)?,
        None => ScrapyardConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("scrapyard-cli v{}", env!("CARGO_PKG_VERSION"));
            let world = &config.world;
            let chunks = world.grid().chunks_overlapping(&world.bounds).len();
            println!(
                "world: seed={} bounds=({:.0}, {:.0})..({:.0}, {:.0}) chunk_size={} chunks={}",
                world.seed,
                world.bounds.min.x,
                world.bounds.min.y,
                world.bounds.max.x,
                world.bounds.max.y,
                world.chunk_size,
                chunks
            );
            println!("{}", config.to_json_pretty()?);
        }
        Commands::Generate { seed, cx, cy, json } => {
            let mut world_config = config.world;
            if let Some(seed) = seed {
                world_config.seed = seed;
            }
            let generator = ChunkGenerator::new(world_config, config.generation.clone());
            let mut world = World::new();
            world.spawn_boundary_walls(&world_config.bounds, WALL_THICKNESS);
            let hills = HeightField::new();
            let ctx = GenContext {
                tracked: &[],
                hills: &hills,
            };
            let plan = generator.generate(ChunkCoord::new(cx, cy), &world, &ctx);
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!(
                    "chunk ({cx}, {cy}) seed={} items={}",
                    world_config.seed,
                    plan.items.len()
                );
                for (i, item) in plan.items.iter().enumerate() {
                    let p = item.position();
                    println!("{i:>4} {:<12} ({:.3}, {:.3})", item.label(), p.x, p.y);
                }
            }
        }
        Commands::Stream {
            ticks,
            speed,
            report_every,
        } => {
            let (mut world, mut manager) = setup(&config);
            let bounds = config.world.bounds;
            let dt = 1.0 / 60.0;
            let mut position = bounds.center();
            let mut velocity = Vec2::new(speed, speed * 0.35);
            let reach = bounds.inset(config.world.chunk_size * 0.5);
            if reach.is_degenerate() {
                anyhow::bail!("world bounds too small for a moving viewer");
            }
            for tick in 1..=ticks {
                position += velocity * dt;
                if position.x < reach.min.x || position.x > reach.max.x {
                    velocity.x = -velocity.x;
                }
                if position.y < reach.min.y || position.y > reach.max.y {
                    velocity.y = -velocity.y;
                }
                position = position.clamp(reach.min, reach.max);
                let inputs = viewer(position);
                let stats = manager.tick(dt, &inputs, &mut world);
                if report_every > 0 && tick % report_every == 0 {
                    tracing::info!(
                        tick,
                        loaded = stats.loaded_chunks,
                        pending_loads = stats.pending_loads,
                        pending_removals = stats.pending_removals,
                        entities = world.entity_count(),
                        "stream progress"
                    );
                }
            }
            println!("{}", StreamInspector::summary(&world, &manager));
        }
        Commands::Height { x, y } => {
            let (mut world, mut manager) = setup(&config);
            let p = Vec2::new(x, y);
            manager.force_refresh(&viewer(p), &mut world);
            let (h, g) = manager.ground_height_and_gradient(p);
            let fd = manager.ground_gradient_fd(p, 0.5);
            println!("height({x:.2}, {y:.2}) = {h:.4}");
            println!("gradient = ({:.5}, {:.5})", g.x, g.y);
            println!("gradient_fd = ({:.5}, {:.5})", fd.x, fd.y);
            println!("hills loaded = {}", manager.heights().len());
        }
        Commands::SpawnPoint {
            x,
            y,
            size,
            radius,
            attempts,
        } => {
            let (mut world, mut manager) = setup(&config);
            let center = Vec2::new(x, y);
            manager.force_refresh(&viewer(center), &mut world);
            let search = Rect::from_center_size(center, Vec2::splat(size));
            let point = find_spawn_point(
                &world,
                &search,
                radius,
                Category::PLACEMENT,
                config.world.seed,
                attempts,
            );
            println!(
                "spawn point = ({:.2}, {:.2}){}",
                point.position.x,
                point.position.y,
                if point.fallback { " [fallback]" } else { "" }
            );
        }
    }

    Ok(())
}

/// A walled world and a manager over it.
fn setup(config: &ScrapyardConfig) -> (World, StreamManager) {
    let mut world = World::new();
    world.spawn_boundary_walls(&config.world.bounds, WALL_THICKNESS);
    let manager = StreamManager::new(
        config.world,
        config.generation.clone(),
        config.stream.clone(),
    );
    (world, manager)
}

/// Screen-sized view centered on a player at `p`.
fn viewer(p: Vec2) -> StreamInputs {
    StreamInputs::new(
        Rect::from_center_size(p, Vec2::new(1920.0, 1080.0)),
        vec![TrackedEntity::new(p, 160.0)],
    )
}
