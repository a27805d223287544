//! Codec throughput benchmarks across algorithms and payload sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tagstore::codec;
use tagstore::CompressionAlgorithm;

const ALGORITHMS: [CompressionAlgorithm; 4] = [
    CompressionAlgorithm::Gzip,
    CompressionAlgorithm::Snappy,
    CompressionAlgorithm::Zstd,
    CompressionAlgorithm::Lz4,
];

const SIZES: [usize; 3] = [1024, 16 * 1024, 256 * 1024];

/// Repetitive payload in the shape of serialized session/config blobs.
fn compressible_payload(len: usize) -> Vec<u8> {
    b"{\"customer_id\":\"c_000042\",\"group\":\"wholesale\",\"currency\":\"USD\"}"
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Incompressible payload; exercises the worst case for every codec.
fn random_payload(len: usize) -> Vec<u8> {
    (0..len).map(|_| rand::random::<u8>()).collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for len in SIZES {
        let payload = compressible_payload(len);
        group.throughput(Throughput::Bytes(len as u64));
        for algorithm in ALGORITHMS {
            group.bench_with_input(
                BenchmarkId::new(algorithm.as_str(), len),
                &payload,
                |b, data| b.iter(|| codec::encode(black_box(data), 1, algorithm)),
            );
        }
    }
    group.finish();
}

fn bench_encode_incompressible(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_incompressible");
    let len = 16 * 1024;
    let payload = random_payload(len);
    group.throughput(Throughput::Bytes(len as u64));
    for algorithm in ALGORITHMS {
        group.bench_with_input(
            BenchmarkId::new(algorithm.as_str(), len),
            &payload,
            |b, data| b.iter(|| codec::encode(black_box(data), 1, algorithm)),
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for len in SIZES {
        let payload = compressible_payload(len);
        group.throughput(Throughput::Bytes(len as u64));
        for algorithm in ALGORITHMS {
            let encoded = codec::encode(&payload, 1, algorithm);
            group.bench_with_input(
                BenchmarkId::new(algorithm.as_str(), len),
                &encoded,
                |b, data| b.iter(|| codec::decode(black_box(data)).expect("Failed to decode")),
            );
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_encode_incompressible,
    bench_decode
);
criterion_main!(benches);
