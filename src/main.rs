use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

mod clean;
mod config;
mod export;
mod ingest;
mod models;
mod pipeline;
mod regions;
mod report;
mod risk;

use config::RiskConfig;
use pipeline::PipelineInputs;

#[derive(Parser)]
#[command(name = "aris-pipeline")]
#[command(about = "Aadhaar regional risk scoring pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Demographic update events CSV
    #[arg(long)]
    demographic: PathBuf,
    /// Biometric events CSV
    #[arg(long)]
    biometric: PathBuf,
    /// Enrolment events CSV
    #[arg(long)]
    enrolment: PathBuf,
    /// Risk weight config (JSON); falls back to $ARIS_WEIGHTS, then defaults
    #[arg(long)]
    weights: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    State,
    District,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write both risk tables
    Run {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "data/processed")]
        out_dir: PathBuf,
    },
    /// Score regions and print the highest-risk rows without writing tables
    Score {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "state")]
        level: Level,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { input, out_dir } => {
            let (inputs, config) = prepare(&input)?;
            let output = pipeline::run(&inputs, &config)?;
            let (state_path, district_path) = export::write_tables(&output, &out_dir)?;

            for summary in &output.summaries {
                println!(
                    "{}: kept {} rows, dropped {} (missing field {}, bad region {}, bad timestamp {})",
                    summary.dataset,
                    summary.kept,
                    summary.dropped(),
                    summary.missing_field,
                    summary.bad_region,
                    summary.bad_timestamp
                );
            }
            println!("State risk table written to {}.", state_path.display());
            println!("District risk table written to {}.", district_path.display());
        }
        Commands::Score {
            input,
            level,
            limit,
        } => {
            let (inputs, config) = prepare(&input)?;
            let output = pipeline::run(&inputs, &config)?;
            let table = match level {
                Level::State => &output.state_table,
                Level::District => &output.district_table,
            };

            println!("Top regions by risk score:");
            for score in table.iter().take(limit) {
                println!(
                    "- {}. {} score {:.2} across {} records",
                    score.rank, score.region, score.score, score.record_count
                );
            }
        }
        Commands::Report { input, out } => {
            let (inputs, config) = prepare(&input)?;
            let output = pipeline::run(&inputs, &config)?;
            let report = report::build_report(&output);
            export::write_text(&report, &out)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn prepare(input: &InputArgs) -> anyhow::Result<(PipelineInputs, RiskConfig)> {
    let config = RiskConfig::resolve(input.weights.as_deref())?;
    let inputs = PipelineInputs {
        demographic: input.demographic.clone(),
        biometric: input.biometric.clone(),
        enrolment: input.enrolment.clone(),
    };
    Ok((inputs, config))
}
