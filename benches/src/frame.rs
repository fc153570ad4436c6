use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use openscan_driver::{config::Resolution, frame::FrameBuffers};

fn from_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("openscan-driver/frame/from_words");

    Resolution::SUPPORTED.iter().for_each(|&pixels| {
        let words = (0..pixels * pixels)
            .map(|i| (i << 16) | (i & 0xFFFF))
            .collect::<Vec<_>>();
        group.bench_with_input(BenchmarkId::new("FrameBuffers", pixels), &words, |b, words| {
            b.iter(|| FrameBuffers::from_words(black_box(pixels), black_box(words)))
        });
    });
    group.finish();
}

criterion_group!(benches, from_words);
criterion_main!(benches);
