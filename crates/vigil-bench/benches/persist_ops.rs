//! Criterion micro-benchmarks for saving and loading a populated manager.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vigil_manager::{ManagerConfig, ObjectManager};
use vigil_stream::{MemoryStream, Serializer};

/// Save `mgr` into a rewound in-memory stream.
fn save(mgr: &mut ObjectManager) -> MemoryStream {
    let mut stream = MemoryStream::new();
    let mut ser = Serializer::new(&mut stream);
    mgr.serialize(&mut ser).unwrap();
    ser.finish().unwrap();
    stream.rewind();
    stream
}

/// Benchmark: Save the 1K reference world.
fn bench_persist_save_1k(c: &mut Criterion) {
    let mut mgr = vigil_bench::reference_world().unwrap();

    c.bench_function("persist_save_1k", |b| {
        b.iter(|| {
            let stream = save(&mut mgr);
            black_box(stream.len());
        });
    });
}

/// Benchmark: Load the 1K reference world into a fresh manager.
fn bench_persist_load_1k(c: &mut Criterion) {
    let mut mgr = vigil_bench::reference_world().unwrap();
    let saved = save(&mut mgr);
    let config = ManagerConfig::new(mgr.container().capacity());

    c.bench_function("persist_load_1k", |b| {
        b.iter(|| {
            let mut stream = saved.clone();
            let mut loaded = ObjectManager::new(&config).unwrap();
            let mut ser = Serializer::new(&mut stream);
            loaded.serialize(&mut ser).unwrap();
            ser.finish().unwrap();
            black_box(loaded.len());
        });
    });
}

criterion_group!(benches, bench_persist_save_1k, bench_persist_load_1k);
criterion_main!(benches);
