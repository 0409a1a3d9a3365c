//! Criterion benchmarks for frame construction.
//!
//! The client builds one frame per control cycle, so validation of an
//! incoming slice and channel updates sit on the hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package dmx-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dmx_core::{DmxFrame, CHANNEL_COUNT};

fn bench_try_from_slice(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..CHANNEL_COUNT).map(|i| (i % 256) as u8).collect();
    c.bench_function("frame_try_from_slice", |b| {
        b.iter(|| DmxFrame::try_from(black_box(bytes.as_slice())))
    });
}

fn bench_set_every_channel(c: &mut Criterion) {
    c.bench_function("frame_set_every_channel", |b| {
        let mut frame = DmxFrame::new();
        b.iter(|| {
            for number in 1..=CHANNEL_COUNT {
                let _ = frame.set_channel(black_box(number), (number % 256) as u8);
            }
        })
    });
}

criterion_group!(benches, bench_try_from_slice, bench_set_every_channel);
criterion_main!(benches);
