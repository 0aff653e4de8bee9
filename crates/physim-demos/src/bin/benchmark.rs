//! Stepping throughput for every demo and evaluator.
//!
//! Run with: cargo run -p physim-demos --bin benchmark --release

use physim_demos::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

const WIDTH: usize = 1280;
const HEIGHT: usize = 720;

/// Step `sim` `steps` times and return the elapsed time.
fn time_steps<S: Simulation, E: KernelEvaluator>(
    sim: &mut S,
    evaluator: &E,
    steps: u32,
) -> Duration {
    let start = Instant::now();
    for frame in 0..u64::from(steps) {
        sim.prepare(frame);
        sim.step(evaluator);
    }
    start.elapsed()
}

fn print_row(name: &str, elements: usize, evaluator: &str, steps: u32, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    println!(
        "{:<20} {:>10} {:>12} {:>12.1} {:>12.0} {:>16.0}",
        name,
        elements,
        evaluator,
        secs * 1000.0,
        f64::from(steps) / secs,
        (elements as f64 * f64::from(steps)) / secs
    );
}

fn bench_demo<S, F>(name: &str, elements: usize, steps: u32, mut build: F)
where
    S: Simulation,
    F: FnMut() -> S,
{
    let evaluators = [CpuEvaluator::new(false), CpuEvaluator::new(true)];
    for evaluator in &evaluators {
        let mut sim = build();
        let elapsed = time_steps(&mut sim, evaluator, steps);
        print_row(name, elements, evaluator.name(), steps, elapsed);
    }
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              PhySim Stepping Performance Evaluation              ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Screen {}x{}, {} hardware threads", WIDTH, HEIGHT, hardware_threads());
    println!();
    println!(
        "{:<20} {:>10} {:>12} {:>12} {:>12} {:>16}",
        "Demo", "Elements", "Evaluator", "Total (ms)", "Steps/sec", "Elem*Steps/sec"
    );
    println!("{}", "-".repeat(88));

    let seed = 0x5eed;

    bench_demo("wave", WIDTH * HEIGHT, 200, || {
        WaveSim::seeded(WIDTH, HEIGHT, WaveParams::default(), &mut SmallRng::seed_from_u64(seed))
    });

    let gravity = GravityParams::default();
    bench_demo("gravity", gravity.particles, 20, || {
        GravitySim::<6>::seeded(WIDTH, HEIGHT, gravity.clone(), &mut SmallRng::seed_from_u64(seed))
    });

    for connectivity in [Connectivity::Orthogonal, Connectivity::Full] {
        let params = SpringParams::default().with_connectivity(connectivity);
        let name = format!("spring/{connectivity:?}").to_lowercase();
        let elements = params.mesh_width * params.mesh_height;
        bench_demo(&name, elements, 1000, || {
            SpringMeshSim::seeded(WIDTH, HEIGHT, params.clone(), &mut SmallRng::seed_from_u64(seed))
        });
    }

    let fountain = FountainParams::default();
    bench_demo("fountain", fountain.particles, 100, || {
        FountainSim::seeded(WIDTH, HEIGHT, fountain.clone(), SmallRng::seed_from_u64(seed))
    });

    println!();
}

fn hardware_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
