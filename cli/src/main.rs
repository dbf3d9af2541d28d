use anyhow::ensure;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::info;
use mineblown_core::{Difficulty, GameConfig};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

mod host;

use host::RunLimits;

/// Headless mineblown host
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Two AI agents play each other on one board
    Duel {
        #[command(flatten)]
        run: RunArgs,

        /// Difficulty of player two, same as player one if omitted
        #[arg(long)]
        opponent: Option<Difficulty>,
    },
    /// Two online peers, each with its own AI, synced through an in-memory relay
    Mirror {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u32>,

    /// AI difficulty: practice, easy, medium or hard
    #[arg(short, long, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,

    /// Simulated seconds before giving up
    #[arg(long, default_value_t = 900)]
    max_secs: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
}

impl RunArgs {
    fn seed(&self) -> u32 {
        self.seed
            .unwrap_or_else(|| SmallRng::from_os_rng().random_range(0..1 << 31))
    }

    fn limits(&self) -> RunLimits {
        RunLimits {
            max_ms: self.max_secs.saturating_mul(1000),
            tick_ms: self.tick_ms,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let config = GameConfig::standard();
    let report = match &cli.mode {
        Mode::Duel { run, opponent } => {
            let seed = run.seed();
            info!("Duel on seed {seed}");
            host::duel(config, seed, [run.difficulty, opponent.unwrap_or(run.difficulty)], run.limits())?
        }
        Mode::Mirror { run } => {
            let seed = run.seed();
            info!("Mirror run on seed {seed}");
            host::mirror(config, seed, run.difficulty, run.limits())?
        }
    };

    info!("{}", serde_json::to_string(&report)?);
    ensure!(report.converged != Some(false), "peers ended with different game states");
    Ok(())
}
