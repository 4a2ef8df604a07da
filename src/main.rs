//! tuning-efficiency CLI
//!
//! Usage:
//!   tuning-efficiency logic.yaml out/ --sclk 1300 --mfma
//!   tuning-efficiency logic.yaml out/ specs.yaml --freq-csv winners.csv
//!   tuning-efficiency logic.yaml out/ --sclk 1500 --per-cu

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tuning_efficiency::{output, run, ConvertConfig, FrequencyOption, Outcome, SpecOptions};

/// Convert the GFLOP/s of a tuning logic file into efficiency percentages
#[derive(Parser)]
#[command(name = "tuning-efficiency")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input logic file
    #[arg(value_name = "INPUT_LOGIC")]
    input: PathBuf,

    /// Output directory for the converted logic file
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// YAML file containing hardware specifications (default: bundled table)
    #[arg(value_name = "HARDWARE_SPECS")]
    specs: Option<PathBuf>,

    /// SCLK frequency in MHz tuning was done at
    #[arg(long, value_name = "MHZ")]
    sclk: Option<u32>,

    /// CSV file giving the winner frequency of every size
    #[arg(long, value_name = "FILE", visible_alias = "inpCSVForFreq")]
    freq_csv: Option<PathBuf>,

    /// Tuning was done per CU
    #[arg(short, long)]
    per_cu: bool,

    /// Only convert files whose name contains this substring
    #[arg(short, long)]
    name: Option<String>,

    /// MFMA instructions were used for tuning
    #[arg(short, long)]
    mfma: bool,

    /// For vega20, tuning was done on mi50 (default mi60)
    #[arg(long)]
    mi50: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let result = FrequencyOption::from_args(cli.sclk, cli.freq_csv).and_then(|frequency| {
        if !quiet {
            match &frequency {
                FrequencyOption::Fixed(mhz) => {
                    output::info(&format!("Frequency based on SCLK parameter: {mhz} MHz"));
                }
                FrequencyOption::Table(path) => {
                    output::info(&format!(
                        "Frequency information from the CSV file {}",
                        path.display()
                    ));
                }
            }
        }
        run(&ConvertConfig {
            input: cli.input,
            output_dir: cli.output_dir,
            specs: cli.specs,
            frequency,
            spec_options: SpecOptions {
                per_cu: cli.per_cu,
                mfma: cli.mfma,
                mi50: cli.mi50,
            },
            name_filter: cli.name,
        })
    });

    match result {
        Ok(outcome) => {
            if !quiet {
                match outcome {
                    Outcome::Converted { output: path, report } => {
                        output::report(&report);
                        output::success(&format!("Wrote {}", path.display()));
                    }
                    Outcome::Skipped { file_name } => {
                        output::info(&format!(
                            "{file_name} does not match the name filter, skipped"
                        ));
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::error(&e.to_string());
            e.exit_code()
        }
    }
}
