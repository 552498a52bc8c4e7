use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use statbase_site::hud::{HudOptions, Scene};
use statbase_site::motion::runner_position;
use statbase_site::plays::catalog;

fn opts() -> HudOptions {
    HudOptions {
        show_play_card: true,
        clamp_to_safe_area: true,
        year: 2025,
    }
}

fn bench_compose(c: &mut Criterion) {
    let play = catalog().get(4);
    let opts = opts();
    c.bench_function("scene_compose_relay", |b| {
        b.iter(|| Scene::compose(black_box(play), black_box(0.42), &opts))
    });
}

fn bench_svg(c: &mut Criterion) {
    let opts = opts();
    let scenes = catalog()
        .plays()
        .iter()
        .map(|play| Scene::compose(play, 0.6, &opts))
        .collect::<Vec<_>>();
    c.bench_function("scene_to_svg_all_plays", |b| {
        b.iter(|| {
            for scene in &scenes {
                black_box(scene.to_svg());
            }
        })
    });
}

fn bench_frame_sweep(c: &mut Criterion) {
    let play = catalog().get(0);
    c.bench_function("runner_position_sweep_60", |b| {
        b.iter(|| {
            for i in 0..60 {
                black_box(runner_position(&play.runner, i as f64 / 60.0));
            }
        })
    });
}

criterion_group!(benches, bench_compose, bench_svg, bench_frame_sweep);
criterion_main!(benches);
