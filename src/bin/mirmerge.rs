use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mirmerge::app::{App, FetchOptions, ProgressSink};
use mirmerge::config::{ConfigLoader, ResolvedConfig};
use mirmerge::domain::Species;
use mirmerge::error::MirError;
use mirmerge::mirgenedb::{MirGeneDbClient, MirGeneDbHttpClient};
use mirmerge::output::{ConsoleOutput, JsonOutput, OutputMode};
use mirmerge::store::Store;

#[derive(Parser)]
#[command(name = "mirmerge")]
#[command(about = "Download MirGeneDB data and merge it into one spreadsheet per species")]
#[command(version, author)]
struct Cli {
    /// Config file (default: ./mirmerge.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Data directory holding the downloaded inputs
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Print JSON results instead of progress lines
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download FASTA and coordinate files")]
    Download(FetchArgs),
    #[command(about = "Save each species' browse table as CSV")]
    Tables(FetchArgs),
    #[command(about = "Merge tables and FASTA files into a workbook")]
    Merge(MergeArgs),
    #[command(about = "Download, fetch tables, then merge")]
    All(AllArgs),
    #[command(about = "Show which inputs are present")]
    Status(SpeciesArgs),
    #[command(about = "Remove the data directory")]
    Clear,
}

#[derive(Args, Clone, Default)]
struct SpeciesArgs {
    /// Restrict to these species (repeatable)
    #[arg(long, value_enum)]
    species: Vec<Species>,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[command(flatten)]
    species: SpeciesArgs,

    #[arg(long)]
    force: bool,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Clone)]
struct MergeArgs {
    #[command(flatten)]
    species: SpeciesArgs,

    /// Output workbook path
    #[arg(long, short)]
    output: Option<String>,
}

#[derive(Args, Clone)]
struct AllArgs {
    #[command(flatten)]
    species: SpeciesArgs,

    #[arg(long, short)]
    output: Option<String>,

    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<MirError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MirError) -> u8 {
    match error {
        MirError::InvalidSpecies(_)
        | MirError::ConfigRead(_)
        | MirError::ConfigParse(_)
        | MirError::InvalidConfig(_)
        | MirError::MissingTable(_)
        | MirError::MissingIdColumn { .. } => 2,
        MirError::Http(_)
        | MirError::HttpStatus { .. }
        | MirError::InvalidUrl(_)
        | MirError::MissingLink { .. }
        | MirError::MissingHtmlTable(_) => 3,
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
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.into();
    }
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &ConsoleOutput,
        OutputMode::NonInteractive => &JsonOutput,
    };

    match cli.command {
        Commands::Download(args) => {
            config.restrict_species(&args.species.species);
            let app = http_app(&config)?;
            let result = app.download(&config.species, fetch_options(&args), sink)?;
            print_fetch(&result, output_mode)
        }
        Commands::Tables(args) => {
            config.restrict_species(&args.species.species);
            let app = http_app(&config)?;
            let result = app.fetch_tables(&config.species, fetch_options(&args), sink)?;
            print_fetch(&result, output_mode)
        }
        Commands::Merge(args) => {
            config.restrict_species(&args.species.species);
            if let Some(output) = args.output {
                config.output = output.into();
            }
            run_merge(&config, output_mode, sink)
        }
        Commands::All(args) => {
            config.restrict_species(&args.species.species);
            if let Some(output) = args.output {
                config.output = output.into();
            }
            let options = FetchOptions {
                force: args.force,
                dry_run: false,
            };
            let app = http_app(&config)?;
            let downloads = app.download(&config.species, options, sink)?;
            print_fetch(&downloads, output_mode)?;
            let tables = app.fetch_tables(&config.species, options, sink)?;
            print_fetch(&tables, output_mode)?;
            run_merge(&config, output_mode, sink)
        }
        Commands::Status(args) => {
            config.restrict_species(&args.species);
            let app = offline_app(&config);
            let result = app.status(&config.species)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_status(&result).into_diagnostic(),
                OutputMode::Interactive => {
                    ConsoleOutput::print_status(&result);
                    Ok(())
                }
            }
        }
        Commands::Clear => {
            let app = offline_app(&config);
            let result = app.clear(sink)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_clear(&result).into_diagnostic(),
                OutputMode::Interactive => Ok(()),
            }
        }
    }
}

fn http_app(config: &ResolvedConfig) -> Result<App<MirGeneDbHttpClient>, MirError> {
    let client = MirGeneDbHttpClient::new()?;
    Ok(App::new(
        Store::new(config.data_dir.clone()),
        client,
        config.base_url.clone(),
    ))
}

fn offline_app(config: &ResolvedConfig) -> App<NopClient> {
    App::new(
        Store::new(config.data_dir.clone()),
        NopClient,
        config.base_url.clone(),
    )
}

#[derive(Clone, Copy)]
struct NopClient;

impl MirGeneDbClient for NopClient {
    fn fetch_text(&self, _url: &str) -> Result<String, MirError> {
        Err(MirError::Http("MirGeneDB client not configured".to_string()))
    }

    fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, MirError> {
        Err(MirError::Http("MirGeneDB client not configured".to_string()))
    }
}

fn fetch_options(args: &FetchArgs) -> FetchOptions {
    FetchOptions {
        force: args.force,
        dry_run: args.dry_run,
    }
}

fn run_merge(
    config: &ResolvedConfig,
    output_mode: OutputMode,
    sink: &dyn ProgressSink,
) -> miette::Result<()> {
    let app = offline_app(config);
    let summary = app.merge(config.merge_config(), &config.output, sink)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_merge(&summary).into_diagnostic(),
        OutputMode::Interactive => {
            ConsoleOutput::print_merge(&summary);
            Ok(())
        }
    }
}

fn print_fetch(result: &mirmerge::app::FetchResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_fetch(result).into_diagnostic(),
        OutputMode::Interactive => {
            ConsoleOutput::print_fetch(result);
            Ok(())
        }
    }
}
