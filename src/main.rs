//! Main CLI application for the catalyst search

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use game_of_life_catalyst::{
    config::{CliOverrides, Settings},
    life::parse_rle,
    search::CatalystProblem,
    utils::ColorOutput,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "game_of_life_catalyst")]
#[command(about = "Game of Life catalyst search")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a catalyst search from a configuration file
    Solve {
        /// Configuration file path
        config: PathBuf,

        /// Keep searching after the first solution (overrides config)
        #[arg(long)]
        continue_after_success: bool,

        /// Skip stable completion of reported solutions
        #[arg(long)]
        no_stabilise: bool,

        /// Suppress the terminating summary
        #[arg(long)]
        no_summary: bool,

        /// Directory to write solution files to (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Create an example configuration file
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Check that an RLE pattern is a still life
    Check {
        /// Pattern file path (plain two-state RLE)
        pattern: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            config,
            continue_after_success,
            no_stabilise,
            no_summary,
            output,
            verbose,
        } => solve_command(
            config,
            continue_after_success,
            no_stabilise,
            no_summary,
            output,
            verbose,
        ),
        Commands::Setup { directory, force } => setup_command(directory, force),
        Commands::Check { pattern } => check_command(pattern),
    }
}

fn solve_command(
    config_path: PathBuf,
    continue_after_success: bool,
    no_stabilise: bool,
    no_summary: bool,
    output_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut settings = Settings::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let overrides = CliOverrides {
        continue_after_success: continue_after_success.then_some(true),
        stabilise_results: no_stabilise.then_some(false),
        print_summary: no_summary.then_some(false),
        minimise_results: None,
        output_dir,
    };
    settings.merge_with_cli(&overrides);

    if verbose {
        println!("Configuration:");
        println!("  First active range: {:?}", settings.first_active_range);
        println!("  Active window range: {:?}", settings.active_window_range);
        println!("  Min stable interval: {}", settings.min_stable_interval);
        println!("  Max active cells: {}", settings.max_active_cells);
        println!("  Symmetry: {:?}", settings.symmetry);
        println!();
    }

    let start_time = Instant::now();
    let mut problem = CatalystProblem::new(settings).context("Failed to create the search")?;
    let solutions = problem.solve().context("Search failed")?;

    if solutions.is_empty() {
        println!("{}", ColorOutput::warning("No catalysts found"));
    } else {
        println!(
            "{}",
            ColorOutput::success(&format!(
                "Found {} catalyst(s) in {:.3}s",
                solutions.len(),
                start_time.elapsed().as_secs_f64()
            ))
        );
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    let config_path = directory.join("catalyst.yaml");
    if config_path.exists() && !force {
        println!("Skipped: {} (already exists)", config_path.display());
        return Ok(());
    }

    let mut settings = Settings::default();
    settings.min_stable_interval = 2;
    settings
        .to_file(&config_path)
        .context("Failed to create the example configuration")?;

    println!("Created: {}", config_path.display());
    println!("\nNext steps:");
    println!("1. Edit the pattern and bounds in {}", config_path.display());
    println!("2. Run: game_of_life_catalyst solve {}", config_path.display());

    Ok(())
}

fn check_command(pattern_path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&pattern_path)
        .with_context(|| format!("Failed to read {}", pattern_path.display()))?;
    let board = parse_rle(&content).context("Failed to parse the pattern")?;

    if board.step() == board {
        println!(
            "{}",
            ColorOutput::success(&format!("Still life with {} cells", board.pop()))
        );
        Ok(())
    } else {
        println!("{}", ColorOutput::error("Not a still life"));
        std::process::exit(1);
    }
}
