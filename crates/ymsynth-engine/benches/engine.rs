//! Benchmarks for voice updates and rendering
//!
//! Run with: cargo bench --bench engine -p ymsynth-engine

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use ymsynth_engine::{Engine, EngineConfig, LoopMode, Patch, PlayMode};

fn busy_patch() -> Patch {
    let mut patch = Patch::default();
    patch.mode = PlayMode::Poly;
    patch.lfo.depth = 0.3;
    patch.noise.time = 0.2;
    patch.ring_mod.enabled = true;
    patch.ring_mod.loop_mode = LoopMode::PingPong;
    patch.sequencer.end = 8;
    patch
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for voices in [1usize, 3] {
        let mut engine = Engine::new(EngineConfig::default()).expect("valid configuration");
        engine.set_patch(busy_patch()).expect("valid patch");
        for pitch in [48u8, 55, 60].iter().take(voices) {
            engine.note_on(0, *pitch, 100);
        }
        let mut left = vec![0.0f32; 4410];
        let mut right = vec![0.0f32; 4410];
        group.bench_with_input(BenchmarkId::new("voices", voices), &voices, |b, _| {
            b.iter(|| {
                engine.render(&mut left, &mut right);
                black_box(&left);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
