//! Benchmarks for HMICB decoding and frame rendering.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use hmicb::{
    animation::{Animation, AnimationWriter, WriterConfig},
    render::{Canvas, render_frame},
};

/// A moving diagonal stripe: mostly delta frames with a few changed pixels each.
fn stripe_animation(size: u16, frames: usize) -> Vec<u8> {
    let mut writer = AnimationWriter::new(size, size, 30, true, WriterConfig::default());
    let n = size as usize;

    for f in 0..frames {
        let mut pixels = vec![0u8; n * n * 4];
        for y in 0..n {
            let x = (y + f) % n;
            let at = (y * n + x) * 4;
            pixels[at..at + 4].copy_from_slice(&[255, (f * 7) as u8, (y * 3) as u8, 255]);
        }
        writer.push_frame(&pixels).unwrap();
    }

    writer.finish().unwrap().0
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [32, 64, 128, 256] {
        let bytes = stripe_animation(size, 60);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &bytes,
            |b, bytes| {
                b.iter(|| Animation::decode(black_box(bytes)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [64, 256] {
        let animation = Animation::decode(&stripe_animation(size, 2)).unwrap();
        let frame = animation.frame(1).unwrap();
        let mut canvas = Canvas::new(size, size);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| render_frame(&mut canvas, black_box(frame)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_render);
criterion_main!(benches);
