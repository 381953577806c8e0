use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sevimpact::config::AnalysisConfig;

#[derive(Parser)]
#[command(
    name = "sevimpact",
    about = "Estimate payments lost during a SEV against a best-fit baseline",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the per-country and total deviation report
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// List the country codes present in the export
    Countries {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// TOML config file (falls back to $SEVIMPACT_CONFIG, then ./sevimpact.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV export to analyse, overriding the config file
    #[arg(long)]
    input: Option<PathBuf>,
}

impl SourceArgs {
    fn resolve(self) -> Result<AnalysisConfig> {
        let mut config = AnalysisConfig::discover(self.config.as_deref())?;
        if let Some(input) = self.input {
            config.input_path = input;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout is stable between runs.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report { source, json } => {
            let config = source.resolve()?;
            tracing::info!(input = %config.input_path.display(), "Running SEV impact report");
            let report = sevimpact::run(&config)?;
            if json {
                let json_output = serde_json::to_string_pretty(&report)?;
                println!("{}", json_output);
            } else {
                print!("{}", report.render());
            }
        }
        Commands::Countries { source } => {
            let config = source.resolve()?;
            let data = sevimpact::ingest::load_csv(&config.input_path)
                .with_context(|| format!("failed to load {}", config.input_path.display()))?;
            let present = sevimpact::country_buckets(&data);
            println!("{:<8} | Buckets", "Country");
            println!("{:-<8}-|-{:-<7}", "", "");
            for (code, buckets) in present {
                let code = if code.is_empty() { "(none)".to_string() } else { code };
                println!("{:<8} | {}", code, buckets);
            }
        }
    }

    Ok(())
}
