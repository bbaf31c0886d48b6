use std::hint::black_box;
use std::time::Instant;

use glam::Vec2;
use scrapyard_common::{ChunkCoord, Rect};
use scrapyard_kernel::World;
use scrapyard_procgen::{ChunkGenerator, GenConfig, GenContext, HeightField, WorldConfig};
use scrapyard_stream::{StreamConfig, StreamInputs, StreamManager};

fn view(center: Vec2, half: f32) -> StreamInputs {
    StreamInputs::new(
        Rect::from_center_size(center, Vec2::splat(half * 2.0)),
        Vec::new(),
    )
}

fn bench_generate(iterations: usize) {
    let generator = ChunkGenerator::new(WorldConfig::default(), GenConfig::default());
    let world = World::new();
    let hills = HeightField::new();
    let ctx = GenContext {
        tracked: &[],
        hills: &hills,
    };

    let start = Instant::now();
    for i in 0..iterations {
        let coord = ChunkCoord::new((i % 16) as i32 - 8, ((i / 16) % 16) as i32 - 8);
        let _ = black_box(generator.generate(black_box(coord), &world, &ctx));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  generate chunk ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_tick(load_budget: usize, unload_budget: usize, iterations: usize) {
    let config = StreamConfig {
        load_budget,
        unload_budget,
        ..StreamConfig::default()
    };
    let mut manager = StreamManager::new(WorldConfig::default(), GenConfig::default(), config);
    let mut world = World::new();

    let start = Instant::now();
    let mut worst = std::time::Duration::ZERO;
    for i in 0..iterations {
        // Viewer sweeps back and forth across the world.
        let t = (i % 400) as f32 / 400.0;
        let x = -14000.0 + 28000.0 * (1.0 - (2.0 * t - 1.0).abs());
        let inputs = view(Vec2::new(x, 0.0), 1500.0);
        let stats = manager.tick(1.0 / 60.0, black_box(&inputs), &mut world);
        worst = worst.max(stats.tick_time);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  tick (L={load_budget}, U={unload_budget}, {iterations} iters): \
         {per_iter:?}/iter, worst {worst:?}, total {elapsed:?}"
    );
}

fn bench_ground_height(iterations: usize) {
    let mut manager = StreamManager::new(
        WorldConfig::default(),
        GenConfig::default(),
        StreamConfig::default(),
    );
    let mut world = World::new();
    manager.force_refresh(&view(Vec2::ZERO, 6000.0), &mut world);

    let start = Instant::now();
    for i in 0..iterations {
        let p = Vec2::new((i % 1000) as f32 * 12.0 - 6000.0, (i / 1000) as f32 % 12000.0 - 6000.0);
        let _ = black_box(manager.ground_height_and_gradient(black_box(p)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  ground height ({} hills, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}",
        manager.heights().len()
    );
}

fn main() {
    println!("=== Stream Benchmarks ===\n");

    println!("Chunk generation:");
    bench_generate(64);
    bench_generate(256);

    println!("\nStream tick (budgeted load/unload):");
    bench_tick(1, 32, 2000);
    bench_tick(2, 64, 2000);
    bench_tick(4, 256, 2000);

    println!("\nGround height queries:");
    bench_ground_height(100_000);

    println!("\n=== Done ===");
}
