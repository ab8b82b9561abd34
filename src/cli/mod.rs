//! refinar CLI - Casting-Plant Data Screening and Prep
//!
//! Command-line interface for refinar operations.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

mod basic;
mod outliers;
mod prep;

// Re-export subcommand enums
pub use outliers::OutlierCommands;
pub use prep::PrepCommands;

/// refinar - Outlier Screening and Table Prep for Casting-Plant Data
#[derive(Parser)]
#[command(name = "refinar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between data formats
    Convert {
        /// Input file path
        input: PathBuf,
        /// Output file path
        output: PathBuf,
    },
    /// Display dataset information
    Info {
        /// Path to dataset file
        path: PathBuf,
    },
    /// Display first N rows of a dataset
    Head {
        /// Path to dataset file
        path: PathBuf,
        /// Number of rows to display
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },
    /// Display dataset schema
    Schema {
        /// Path to dataset file
        path: PathBuf,
    },
    /// Outlier detection and cleaning commands
    #[command(subcommand)]
    Outliers(OutlierCommands),
    /// Table preparation commands
    #[command(subcommand)]
    Prep(PrepCommands),
}

/// Run the refinar CLI.
#[allow(clippy::too_many_lines)]
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert { input, output } => basic::cmd_convert(&input, &output),
        Commands::Info { path } => basic::cmd_info(&path),
        Commands::Head { path, rows } => basic::cmd_head(&path, rows),
        Commands::Schema { path } => basic::cmd_schema(&path),
        Commands::Outliers(outlier_cmd) => match outlier_cmd {
            OutlierCommands::Analyze {
                path,
                factor,
                zscore_threshold,
                thresholds,
                methods,
                format,
            } => outliers::cmd_analyze(
                &path,
                factor,
                zscore_threshold,
                thresholds.as_deref(),
                &methods,
                &format,
            ),
            OutlierCommands::Summary {
                path,
                factor,
                zscore_threshold,
                thresholds,
                methods,
                output,
            } => outliers::cmd_summary(
                &path,
                factor,
                zscore_threshold,
                thresholds.as_deref(),
                &methods,
                output.as_ref(),
            ),
            OutlierCommands::Clean {
                path,
                output,
                method,
                factor,
                thresholds,
                compare,
            } => outliers::cmd_clean(
                &path,
                &output,
                &method,
                factor,
                thresholds.as_deref(),
                compare,
            ),
        },
        Commands::Prep(prep_cmd) => match prep_cmd {
            PrepCommands::Merge {
                vars,
                products,
                heats,
                output,
                variable,
                value_code,
            } => prep::cmd_merge(&vars, &products, &heats, &output, &variable, value_code),
            PrepCommands::Filter {
                path,
                output,
                grade_column,
                grade,
                date_column,
                year,
            } => prep::cmd_filter(
                &path,
                &output,
                &grade_column,
                grade.as_deref(),
                &date_column,
                year,
            ),
            PrepCommands::Join {
                left,
                right,
                on,
                how,
                output,
            } => prep::cmd_join(&left, &right, &on, &how, &output),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
