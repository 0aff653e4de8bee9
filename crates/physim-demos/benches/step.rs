//! Per-step cost of each demo rule under both evaluators.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use physim_demos::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

const WIDTH: usize = 640;
const HEIGHT: usize = 360;

fn evaluators() -> [CpuEvaluator; 2] {
    [CpuEvaluator::new(false), CpuEvaluator::new(true)]
}

/// Benchmark the wave stencil over the grid interior
fn bench_wave(c: &mut Criterion) {
    let mut group = c.benchmark_group("wave/step");
    group.throughput(Throughput::Elements((WIDTH * HEIGHT) as u64));

    for evaluator in evaluators() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut sim = WaveSim::seeded(WIDTH, HEIGHT, WaveParams::default(), &mut rng);
        group.bench_function(BenchmarkId::from_parameter(evaluator.name()), |b| {
            b.iter(|| {
                sim.step(&evaluator);
                black_box(sim.current().get(WIDTH / 2, HEIGHT / 2));
            });
        });
    }

    group.finish();
}

/// Benchmark all-pairs gravity at a few particle counts
fn bench_gravity(c: &mut Criterion) {
    let mut group = c.benchmark_group("gravity/step");

    for particles in [128usize, 512] {
        group.throughput(Throughput::Elements((particles * particles) as u64));
        for evaluator in evaluators() {
            let mut rng = SmallRng::seed_from_u64(2);
            let params = GravityParams::default().with_particles(particles);
            let mut sim = GravitySim::<6>::seeded(WIDTH, HEIGHT, params, &mut rng);
            group.bench_with_input(
                BenchmarkId::new(evaluator.name(), particles),
                &particles,
                |b, _| {
                    b.iter(|| {
                        sim.step(&evaluator);
                        black_box(sim.particles().read(0, 0));
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the spring lattice with both topologies
fn bench_spring(c: &mut Criterion) {
    let mut group = c.benchmark_group("spring/step");

    for connectivity in [Connectivity::Orthogonal, Connectivity::Full] {
        let name = format!("{connectivity:?}").to_lowercase();
        for evaluator in evaluators() {
            let mut rng = SmallRng::seed_from_u64(3);
            let params = SpringParams::default()
                .with_mesh(64, 64)
                .with_connectivity(connectivity);
            let mut sim = SpringMeshSim::seeded(WIDTH, HEIGHT, params, &mut rng);
            let mut frame = 0;
            group.bench_function(BenchmarkId::new(name.as_str(), evaluator.name()), |b| {
                b.iter(|| {
                    sim.prepare(frame);
                    sim.step(&evaluator);
                    frame += 1;
                });
            });
        }
    }

    group.finish();
}

/// Benchmark the ballistic integrator
fn bench_fountain(c: &mut Criterion) {
    let mut group = c.benchmark_group("fountain/step");
    let params = FountainParams::default();
    group.throughput(Throughput::Elements(params.particles as u64));

    for evaluator in evaluators() {
        let rng = SmallRng::seed_from_u64(4);
        let mut sim = FountainSim::seeded(WIDTH, HEIGHT, params.clone(), rng);
        group.bench_function(BenchmarkId::from_parameter(evaluator.name()), |b| {
            b.iter(|| {
                sim.step(&evaluator);
                black_box(sim.particles().read(0, 1));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wave, bench_gravity, bench_spring, bench_fountain);
criterion_main!(benches);
