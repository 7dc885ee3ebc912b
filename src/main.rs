use anyhow::Result;
use billing_usage::analyzer::{AnalysisCommand, UsageAnalyzer};
use billing_usage::config::Config;
use billing_usage::logging;
use billing_usage::models::Dimension;
use clap::{Parser, Subcommand};
use std::process;
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "billing-usage")]
#[command(about = "Cost and usage breakdown of organization billing exports")]
#[command(version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank users or repositories by cost for one month
    Overview {
        /// Billing category (e.g. actions, codespaces, storage)
        #[arg(long, short)]
        category: String,
        /// Month to report (YYYY-MM)
        #[arg(long, short)]
        month: String,
        /// Group by user or repository
        #[arg(long, value_enum, default_value_t = Dimension::Actor)]
        by: Dimension,
        /// Show only the top N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Month-by-month cost and usage of one user or repository
    Trend {
        /// Billing category
        #[arg(long, short)]
        category: String,
        /// Year to report (YYYY)
        #[arg(long, short)]
        year: i32,
        /// User or repository name
        #[arg(long, short)]
        name: String,
        /// Whether the name is a user or a repository
        #[arg(long, value_enum, default_value_t = Dimension::Actor)]
        by: Dimension,
    },
    /// Cost per category for one month
    Summary {
        /// Month to report (YYYY-MM)
        #[arg(long, short)]
        month: String,
    },
    /// List the configured billing categories
    Categories,
}

impl From<Commands> for AnalysisCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Overview {
                category,
                month,
                by,
                limit,
            } => AnalysisCommand::Overview {
                category,
                period_key: month,
                dimension: by,
                limit,
            },
            Commands::Trend {
                category,
                year,
                name,
                by,
            } => AnalysisCommand::Trend {
                category,
                year,
                target: name,
                dimension: by,
            },
            Commands::Summary { month } => AnalysisCommand::Summary { period_key: month },
            Commands::Categories => AnalysisCommand::Categories,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => handle_error(e, json),
    };
    let _log_guard = logging::init_logging(&config.logging, &config.paths.log_directory);

    let command = AnalysisCommand::from(cli.command);
    let span = logging::run_span(command.name());

    match run(&config, &command, json).instrument(span).await {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, json),
    }
}

#[cfg(not(feature = "remote"))]
async fn run(config: &Config, command: &AnalysisCommand, json: bool) -> Result<()> {
    use billing_usage::loader::FileSource;

    let analyzer = UsageAnalyzer::new(config, FileSource::new(&config.source.data_dir));
    analyzer.run_command(command, json).await
}

#[cfg(feature = "remote")]
async fn run(config: &Config, command: &AnalysisCommand, json: bool) -> Result<()> {
    use billing_usage::loader::{FileSource, HttpSource};

    match &config.source.base_url {
        Some(base_url) => {
            let analyzer = UsageAnalyzer::new(config, HttpSource::new(base_url.as_str()));
            analyzer.run_command(command, json).await
        }
        None => {
            let analyzer = UsageAnalyzer::new(config, FileSource::new(&config.source.data_dir));
            analyzer.run_command(command, json).await
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
