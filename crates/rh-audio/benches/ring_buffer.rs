//! Benchmarks for the audio ring buffer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rh_audio::RingBuffer;

fn bench_write_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");

    // Typical per-frame batch sizes: 32 kHz / 60, 44.1 kHz / 60, 48 kHz / 50
    for frames in [533usize, 735, 960].iter() {
        group.throughput(Throughput::Elements(*frames as u64));

        group.bench_with_input(BenchmarkId::new("write", frames), frames, |b, &frames| {
            let ring = RingBuffer::new(12288);
            let samples = vec![0x1234i16; frames * 2];
            b.iter(|| ring.write(black_box(&samples), frames));
        });

        group.bench_with_input(BenchmarkId::new("write_pull", frames), frames, |b, &frames| {
            let ring = RingBuffer::new(12288);
            let samples = vec![0x1234i16; frames * 2];
            let mut out = vec![0i16; frames * 2];
            b.iter(|| {
                ring.write(&samples, frames);
                black_box(ring.pull_into(&mut out));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_pull);
criterion_main!(benches);
