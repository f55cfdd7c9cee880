// Released under MIT License.
// Copyright (c) 2024 David Quigley

use criterion::{criterion_group, criterion_main, Criterion};
use dcd_tools::prelude::*;
use ndarray::Array3;

fn chain_system(nchains: usize, nbeads: usize) -> ChainSystem {
    let positions = Array3::from_shape_fn((nchains, nbeads, 3), |(c, b, d)| {
        (c * 100 + b * 10 + d + 1) as f64 * 0.01
    });

    ChainSystem::from_positions(positions)
        .unwrap()
        .with_cell(CellMatrix::orthorhombic([110.0, 120.0, 130.0]))
}

fn benchmark(c: &mut Criterion) {
    let system = chain_system(1000, 20);
    let output = tempfile::Builder::new().suffix(".dcd").tempfile().unwrap();
    let mut writer = DcdWriter::new(&system, output.path()).unwrap();

    c.bench_function("DcdWriter::write_frame (1000x20)", |b| {
        b.iter(|| {
            writer.write_frame(std::hint::black_box(&system)).unwrap();
        })
    });

    let psf = tempfile::Builder::new().suffix(".psf").tempfile().unwrap();
    c.bench_function("ChainSystem::write_psf (1000x20)", |b| {
        b.iter(|| {
            system.write_psf(std::hint::black_box(psf.path())).unwrap();
        })
    });

    c.bench_function("ChainSystem::beads_iter", |b| {
        b.iter(|| {
            std::hint::black_box(system.beads_iter().fold(0.0, |sum, bead| sum + bead.x));
        })
    });

    let small = chain_system(10, 4);
    let trajectory = tempfile::Builder::new().suffix(".dcd").tempfile().unwrap();
    {
        let mut writer = DcdWriter::new(&small, trajectory.path()).unwrap();
        for _ in 0..1000 {
            writer.write_frame(&small).unwrap();
        }
    }

    c.bench_function("DcdReader (1000 frames, step 10)", |b| {
        b.iter(|| {
            std::hint::black_box(
                DcdReader::open(trajectory.path())
                    .unwrap()
                    .with_step(10)
                    .unwrap()
                    .count(),
            );
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
