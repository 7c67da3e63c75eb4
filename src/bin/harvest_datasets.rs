use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use catalogue_harvester::catalogue::CatalogueHttpClient;
use catalogue_harvester::config::ConfigLoader;
use catalogue_harvester::error::HarvestError;
use catalogue_harvester::export::{ExportOptions, export_all};
use catalogue_harvester::harvest::Harvester;
use catalogue_harvester::output::{JsonOutput, RunSummary};

#[derive(Parser)]
#[command(name = "harvest-datasets")]
#[command(about = "Harvest dataset metadata from the catalogue into v1 and v2 dataset JSON")]
#[command(version, author)]
struct Cli {
    /// JSON config overriding endpoints, schema stamps and sitemap pages
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = ".")]
    output_dir: Utf8PathBuf,

    /// Also write datasets.csv, dataclasses.csv and dataelements.csv
    #[arg(long)]
    csv: bool,

    /// Also write sitemap.txt
    #[arg(long)]
    sitemap: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::MissingConfig(_)
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_)
        | HarvestError::UnboundPlaceholder { .. } => 2,
        HarvestError::Http(_) | HarvestError::Status { .. } | HarvestError::InvalidJson { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let options = ExportOptions {
        output_dir: cli.output_dir,
        csv: cli.csv,
        sitemap: cli.sitemap,
    };

    let client = CatalogueHttpClient::new()?;
    let harvester = Harvester::new(client, config);
    let result = harvester.harvest()?;
    let files = export_all(&result, harvester.config(), &options)?;

    JsonOutput::print_summary(&RunSummary::new(&result, &files)).into_diagnostic()?;
    Ok(())
}
