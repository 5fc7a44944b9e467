//! Benchmarks for batched simulation
//!
//! Run with: cargo bench -p polyq-adapter-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use polyq_adapter_sim::SimulatorBackend;
use polyq_ir::{Builder, CircuitSpec, QubitId};

/// Layered feature map: encode, entangle, re-encode.
fn layered_circuit(num_qubits: u32, batch: usize, measured: bool) -> CircuitSpec {
    let features = Array2::from_shape_fn((batch, num_qubits as usize), |(i, j)| {
        0.1 * (i + j) as f64
    });
    let params = Array2::from_elem((1, num_qubits as usize), 0.3);

    let mut bdr = Builder::new(num_qubits, batch).unwrap();
    bdr.alldiam().unwrap().allin(features.view()).unwrap();
    for q in 0..num_qubits.saturating_sub(1) {
        bdr.cz(QubitId(q), QubitId(q + 1)).unwrap();
    }
    bdr.allin_y(params.view()).unwrap();
    if measured {
        bdr.measure_all().unwrap();
    }
    bdr.circuit().unwrap()
}

/// Exact execution over growing batches
fn bench_exact_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_batch");
    let backend = SimulatorBackend::new();

    for batch in &[1usize, 16, 128] {
        let circuit = layered_circuit(6, *batch, false);
        group.bench_with_input(BenchmarkId::new("rows", batch), &circuit, |b, circuit| {
            b.iter(|| backend.run(black_box(circuit), None).unwrap());
        });
    }

    group.finish();
}

/// Sampling cost per shot count
fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    let backend = SimulatorBackend::new().with_seed(1);
    let circuit = layered_circuit(6, 16, true);

    for shots in &[100u32, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("shots", shots), shots, |b, &shots| {
            b.iter(|| backend.run(black_box(&circuit), Some(shots)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_exact_batch, bench_sampling);
criterion_main!(benches);
