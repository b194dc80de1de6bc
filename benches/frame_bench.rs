//! Performance benchmarks for inbound frame decoding.
//!
//! Image frames dominate the hub traffic by size, so the interesting numbers
//! are the cost of classifying a small control frame and the cost of decoding
//! an image frame carrying a realistic base64 JPEG.
//!
//! # Run Benchmarks
//!
//! ```sh
//! cargo bench --bench frame_bench
//! cargo bench --bench frame_bench -- image
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use labelcheck_protocol::parse_frame;
use std::hint::black_box;

const BARCODE_FRAME: &str =
    r#"{"messageType":"barcode","scannerId":1,"barcode":"1Z12345E0205271688","status":true}"#;

const UNKNOWN_FRAME: &str = r#"{"messageType":"firmware_update","scannerId":1,"status":true}"#;

fn image_frame(payload_len: usize) -> String {
    let image = "A".repeat(payload_len);
    format!(r#"{{"messageType":"image","scannerId":1,"image":"{image}","status":true}}"#)
}

fn bench_control_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("control_frames");

    group.bench_function("barcode", |b| {
        b.iter(|| parse_frame(black_box(BARCODE_FRAME)))
    });

    group.bench_function("unknown_tag", |b| {
        b.iter(|| parse_frame(black_box(UNKNOWN_FRAME)))
    });

    group.finish();
}

fn bench_image_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("image");

    for size in [16 * 1024, 256 * 1024, 1024 * 1024] {
        let frame = image_frame(size);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| parse_frame(black_box(frame)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_control_frames, bench_image_frames);
criterion_main!(benches);
