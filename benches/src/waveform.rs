use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use openscan_driver::{config::Resolution, waveform::Waveform};

fn generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("openscan-driver/waveform/generate");

    Resolution::SUPPORTED
        .iter()
        .filter_map(|&pixels| Resolution::new(pixels).ok())
        .for_each(|resolution| {
            group.bench_with_input(
                BenchmarkId::new("Waveform", resolution.pixels()),
                &resolution,
                |b, &resolution| {
                    b.iter(|| Waveform::generate(black_box(resolution), 1.0, 0.5, -0.5))
                },
            );
        });
    group.finish();
}

fn pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("openscan-driver/waveform/pack");

    Resolution::SUPPORTED.iter().for_each(|&pixels| {
        let Ok(waveform) = Resolution::new(pixels)
            .and_then(|resolution| Waveform::generate(resolution, 1.0, 0.0, 0.0))
        else {
            return;
        };
        group.bench_with_input(BenchmarkId::new("packed_line", pixels), &waveform, |b, waveform| {
            let mut buf = Vec::with_capacity(waveform.elements_per_line());
            b.iter(|| {
                (0..waveform.lines()).for_each(|line| {
                    buf.clear();
                    buf.extend(waveform.packed_line(line));
                    black_box(&buf);
                })
            })
        });
    });
    group.finish();
}

criterion_group!(benches, generate, pack);
criterion_main!(benches);
