//! Benchmarks for relzw recompression throughput.
//!
//! Measures the full pipeline (parse, decode, shortest-path optimization,
//! emission) over synthetic images with different entropy profiles.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

use relzw::{GifRecompressor, Recompress, RecompressConfig};

/// Simple xorshift PRNG, deterministic across runs
fn generate_random_data(size: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = seed;
    for _ in 0..size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

/// Flat single-color image data
fn generate_flat_data(size: usize) -> Vec<u8> {
    vec![7; size]
}

/// Dithered gradient, the typical worst case for run detection
fn generate_dither_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i % 3) as u8) * 2 + ((i / 17) % 2) as u8).collect()
}

/// Wrap pixels into a single-frame GIF with a weezl-encoded payload
fn build_gif(width: u16, height: u16, code_size: u8, pixels: &[u8]) -> Vec<u8> {
    let stream = weezl::encode::Encoder::new(weezl::BitOrder::Lsb, code_size)
        .encode(pixels)
        .expect("weezl encode");

    let mut out = Vec::new();
    out.extend_from_slice(b"GIF89a");
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(0b1000_0111);
    out.push(0);
    out.push(0);
    for i in 0..=255u8 {
        out.extend_from_slice(&[i, i, i]);
    }
    out.push(0x2C);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(0);
    out.push(code_size);
    for chunk in stream.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out.push(0x3B);
    out
}

fn bench_recompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompress");

    let cases = [
        ("flat", generate_flat_data(16 * 1024)),
        ("dither", generate_dither_data(16 * 1024)),
        ("random", generate_random_data(16 * 1024, 42).iter().map(|b| b & 0x0F).collect()),
    ];

    for (name, pixels) in &cases {
        let input = build_gif(128, 128, 4, pixels);
        group.throughput(Throughput::Bytes(pixels.len() as u64));

        group.bench_with_input(BenchmarkId::new("greedy", name), &input, |b, input| {
            b.iter(|| {
                let mut out = Vec::new();
                GifRecompressor::new(RecompressConfig::default())
                    .recompress(Cursor::new(input), &mut out)
                    .unwrap();
                out
            })
        });

        group.bench_with_input(BenchmarkId::new("nongreedy", name), &input, |b, input| {
            let config = RecompressConfig { greedy: false, ..Default::default() };
            b.iter(|| {
                let mut out = Vec::new();
                GifRecompressor::new(config.clone())
                    .recompress(Cursor::new(input), &mut out)
                    .unwrap();
                out
            })
        });

        group.bench_with_input(BenchmarkId::new("aligned-64", name), &input, |b, input| {
            let config = RecompressConfig { alignment: 64, ..Default::default() };
            b.iter(|| {
                let mut out = Vec::new();
                GifRecompressor::new(config.clone())
                    .recompress(Cursor::new(input), &mut out)
                    .unwrap();
                out
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_recompress);
criterion_main!(benches);
