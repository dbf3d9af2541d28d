use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use mineblown_core::*;
use std::hint::black_box;

fn bench_generation(c: &mut Criterion) {
    let config = GameConfig::standard();
    c.bench_function("generate/standard", |b| {
        let mut seed = 0u32;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(SeededGenerator::new(seed).generate(&config))
        })
    });

    let dense = GameConfig::new((24, 24), 0.6).unwrap();
    c.bench_function("generate/dense", |b| {
        b.iter(|| black_box(SeededGenerator::new(black_box(7)).generate(&dense)))
    });
}

fn bench_flood_fill(c: &mut Criterion) {
    // no mines at all: one reveal opens the whole board
    let open = MineLayout::from_mine_coords((64, 64), &[]).unwrap();
    c.bench_function("reveal/open_64x64", |b| {
        b.iter_batched(
            || Engine::from_layout(&open).unwrap(),
            |mut engine| black_box(engine.reveal(PlayerId::One, (32, 32), 0)),
            BatchSize::SmallInput,
        )
    });

    let engine = Engine::new(GameConfig::standard(), 2024).unwrap();
    c.bench_function("reveal/standard_corner", |b| {
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.reveal(PlayerId::One, (0, 0), 0)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_analysis(c: &mut Criterion) {
    let mut engine = Engine::new(GameConfig::standard(), 99).unwrap();
    for player in PlayerId::ALL {
        engine.reveal(player, engine.config().spawn(player), 0).unwrap();
    }

    c.bench_function("analysis/observe", |b| {
        b.iter(|| black_box(Observation::from_engine(&engine)))
    });

    let observation = Observation::from_engine(&engine);
    c.bench_function("analysis/deduce", |b| b.iter(|| black_box(deduce(&observation))));
}

criterion_group!(benches, bench_generation, bench_flood_fill, bench_analysis);
criterion_main!(benches);
