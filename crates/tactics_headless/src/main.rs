//! Headless tactics match runner.
//!
//! Plays AI-vs-AI matches without a UI. Designed for AI testing, balance
//! batches and catalog validation.
//!
//! # Usage
//!
//! ```bash
//! # Play one match on the bundled castle scenario
//! cargo run -p tactics_headless -- run --seed 42 --ascii
//!
//! # Run a batch of seeded matches
//! cargo run -p tactics_headless -- batch --count 1000 --output results/batch.json
//!
//! # Validate and list a catalog
//! cargo run -p tactics_headless -- catalog --path my_units.ron
//! ```
//!
//! # Output
//!
//! Results (JSON, ASCII boards, catalog tables) go to stdout.
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_core::config::GameConfig;
use tactics_headless::{
    ascii::{render_board, AsciiConfig},
    batch::{run_batch, BatchConfig},
    catalog_loader::{describe_catalog, load_catalog},
    error::Result,
    runner::{MatchRunner, DEFAULT_MAX_TURNS},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactics match runner for AI testing and balance checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single AI-vs-AI match
    Run {
        /// Seed for both AI controllers
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Stop after this many whole turns
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: i32,

        /// Unit catalog RON file (defaults to the bundled catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Scenario RON file (defaults to the castle scenario)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// GameConfig RON file overriding the scenario's board settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the board after every half-turn
        #[arg(long)]
        ascii: bool,

        /// Disable colored ASCII output
        #[arg(long)]
        no_color: bool,
    },

    /// Run a batch of seeded matches in parallel
    Batch {
        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Seed of the first match
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Stop each match after this many whole turns
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: i32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Unit catalog RON file (defaults to the bundled catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Scenario RON file (defaults to the castle scenario)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// GameConfig RON file overriding the scenario's board settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the JSON summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a unit catalog and list its kinds
    Catalog {
        /// Catalog RON file (defaults to the bundled catalog)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            seed,
            max_turns,
            catalog,
            scenario,
            config,
            ascii,
            no_color,
        } => cmd_run(
            seed,
            max_turns,
            catalog.as_deref(),
            scenario.as_deref(),
            config.as_deref(),
            ascii.then_some(!no_color),
        ),
        Commands::Batch {
            count,
            seed,
            max_turns,
            parallel,
            catalog,
            scenario,
            config,
            output,
        } => cmd_batch(
            BatchConfig {
                game_count: count,
                seed_start: seed,
                max_turns,
                parallel_games: parallel,
            },
            catalog.as_deref(),
            scenario.as_deref(),
            config.as_deref(),
            output.as_deref(),
        ),
        Commands::Catalog { path } => cmd_catalog(path.as_deref()),
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Scenario from a file or the castle default, with an optional config
/// file replacing its board settings.
fn load_scenario(scenario: Option<&Path>, config: Option<&Path>) -> Result<Scenario> {
    let mut loaded = match scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::castles(),
    };
    if let Some(path) = config {
        let source = std::fs::read_to_string(path)?;
        loaded = loaded.with_config(GameConfig::from_ron_str(&source)?);
    }
    Ok(loaded)
}

/// Play one match, optionally printing the board as it goes.
fn cmd_run(
    seed: u64,
    max_turns: i32,
    catalog: Option<&Path>,
    scenario: Option<&Path>,
    config: Option<&Path>,
    ascii_color: Option<bool>,
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let scenario = load_scenario(scenario, config)?;
    tracing::info!(scenario = %scenario.name, seed, max_turns, "Starting match");

    let mut runner = MatchRunner::new(&scenario, catalog, seed, max_turns)?;
    if let Some(use_color) = ascii_color {
        let view = AsciiConfig {
            show_legend: true,
            use_color,
        };
        println!("{}", render_board(runner.game().board(), &view));
        while let Some(report) = runner.step()? {
            for decision in &report.decisions {
                println!(
                    "  {:?} {} at {}: {:?}",
                    report.player, decision.rule, decision.from, decision.action
                );
            }
            println!("{}", render_board(runner.game().board(), &view));
        }
    } else {
        while runner.step()?.is_some() {}
    }

    let result = runner.finish();
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Run a batch and emit the JSON results.
fn cmd_batch(
    config: BatchConfig,
    catalog: Option<&Path>,
    scenario: Option<&Path>,
    game_config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let scenario = load_scenario(scenario, game_config)?;
    let results = run_batch(&scenario, catalog, config);

    match output {
        Some(path) => {
            results.save(path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        None => println!("{}", results.to_json()?),
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.matches.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  seed {}: {}", error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Draws: {}", results.summary.draws);
    eprintln!("Win rates:");
    for (player, rate) in &results.summary.win_rates {
        eprintln!("  {}: {:.1}%", player, rate * 100.0);
    }
    Ok(())
}

/// Validate a catalog and print its kinds.
fn cmd_catalog(path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(path)?;
    print!("{}", describe_catalog(&catalog));
    eprintln!("{} unit kinds OK", catalog.len());
    Ok(())
}
