//! PhySim - run the stepped simulation demos.
//!
//! # Commands
//!
//! - `physim wave` - 2D wave equation with random drops
//! - `physim gravity` - all-pairs N-body gravity
//! - `physim spring` - driven spring lattice
//! - `physim fountain` - ballistic particle fountain
//!
//! # Examples
//!
//! ```bash
//! # Run 500 wave frames single-threaded
//! physim wave --frames 500 --sequential
//!
//! # 8-neighbor mesh with gravity and a floor, from a config file
//! physim spring --connectivity full --config spring.toml
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use physim_demos::simulation::{Connectivity, RespawnPolicy};
use physim_demos::{run_demo, DemoConfig, DemoKind, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// PhySim - stepped numerical simulation demos
#[derive(Parser)]
#[command(name = "physim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every demo.
#[derive(Args)]
struct RunArgs {
    /// Number of frames to run (default: until interrupted, 100 for fountain)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Present every N-th frame, 0 to disable display
    #[arg(short, long)]
    display_every: Option<u64>,

    /// Evaluate on a single thread
    #[arg(long)]
    sequential: bool,

    /// Seed for the initial state
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 2D wave equation on a height field
    Wave {
        #[command(flatten)]
        run: RunArgs,

        /// Propagation factor (stable up to 0.5)
        #[arg(long)]
        scale: Option<f32>,
    },

    /// All-pairs N-body gravity
    Gravity {
        #[command(flatten)]
        run: RunArgs,

        /// Number of particles
        #[arg(short, long)]
        particles: Option<usize>,

        /// Give particles mass and add a heavy anchor
        #[arg(long)]
        with_mass: bool,
    },

    /// Driven 2D spring lattice
    Spring {
        #[command(flatten)]
        run: RunArgs,

        /// Spring topology
        #[arg(long, value_enum)]
        connectivity: Option<Connectivity>,
    },

    /// Ballistic particle fountain
    Fountain {
        #[command(flatten)]
        run: RunArgs,

        /// Number of particles
        #[arg(short, long)]
        particles: Option<usize>,

        /// What to do with particles that leave the screen
        #[arg(long, value_enum)]
        respawn: Option<RespawnPolicy>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("physim=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("physim=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(run: &RunArgs) -> physim_core::Result<DemoConfig> {
    match &run.config {
        Some(path) => DemoConfig::load(path),
        None => Ok(DemoConfig::default()),
    }
}

fn execute(kind: DemoKind, run: &RunArgs, config: DemoConfig) -> physim_core::Result<()> {
    let options = RunOptions {
        frames: run.frames,
        display_every: run.display_every,
        seed: run.seed,
        sequential: run.sequential,
    };
    let outcome = run_demo(kind, &config, &options)?;
    let summary = outcome.summary;

    println!(
        "{} {} frames in {:.2?} ({} fps, {} displayed)",
        kind.to_string().bright_white().bold(),
        summary.frames,
        summary.elapsed,
        format!("{:.1}", summary.frames_per_sec()).bright_green(),
        summary.displayed
    );
    if summary.displayed > 0 {
        println!("  last frame checksum {:016x}", outcome.checksum);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Wave { run, scale } => load_config(&run).and_then(|mut config| {
            if let Some(scale) = scale {
                config.wave.scale = scale;
            }
            execute(DemoKind::Wave, &run, config)
        }),

        Commands::Gravity {
            run,
            particles,
            with_mass,
        } => load_config(&run).and_then(|mut config| {
            if let Some(particles) = particles {
                config.gravity.particles = particles;
            }
            config.gravity.with_mass |= with_mass;
            execute(DemoKind::Gravity, &run, config)
        }),

        Commands::Spring { run, connectivity } => load_config(&run).and_then(|mut config| {
            if let Some(connectivity) = connectivity {
                config.spring.connectivity = connectivity;
            }
            execute(DemoKind::Spring, &run, config)
        }),

        Commands::Fountain {
            run,
            particles,
            respawn,
        } => load_config(&run).and_then(|mut config| {
            if let Some(particles) = particles {
                config.fountain.particles = particles;
            }
            if let Some(respawn) = respawn {
                config.fountain.respawn = respawn;
            }
            execute(DemoKind::Fountain, &run, config)
        }),

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Cli::command(), "physim", &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
