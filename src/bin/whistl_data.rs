use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use whistl_datasets::app::{App, BuildOptions, ProgressSink};
use whistl_datasets::config::ConfigLoader;
use whistl_datasets::error::DatasetError;
use whistl_datasets::output::{JsonOutput, TracingSink};

#[derive(Parser)]
#[command(name = "whistl-data")]
#[command(about = "Assemble labelled gene-expression training sets from refine.bio exports")]
#[command(version, author)]
struct Cli {
    /// Config file (default: whistl.json in the current directory)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Suppress progress logging
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List study directories under data_root")]
    Dirs,
    #[command(about = "Compute the genes shared by every study directory")]
    Genes(GenesArgs),
    #[command(about = "Assemble a labelled dataset")]
    Build(BuildArgs),
}

#[derive(Args)]
struct GenesArgs {
    /// Print the gene identifiers, not only their count
    #[arg(long)]
    list: bool,
}

#[derive(Args)]
struct BuildArgs {
    #[command(subcommand)]
    source: BuildSource,
}

#[derive(Subcommand)]
enum BuildSource {
    #[command(about = "Build from per-study directories")]
    Refinebio(BuildFlags),
    #[command(about = "Build from the compendium matrix")]
    Compendium(BuildFlags),
}

#[derive(Args, Clone)]
struct BuildFlags {
    /// Leave out studies containing the configured holdout label
    #[arg(long)]
    exclude_holdout: bool,

    /// Write the assembled matrix (and a .labels.tsv beside it)
    #[arg(long)]
    output: Option<Utf8PathBuf>,
}

impl From<BuildFlags> for BuildOptions {
    fn from(flags: BuildFlags) -> Self {
        BuildOptions {
            exclude_holdout: flags.exclude_holdout,
            output: flags.output,
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<DatasetError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DatasetError) -> u8 {
    match error {
        DatasetError::MissingConfig
        | DatasetError::ConfigRead(_)
        | DatasetError::MissingSetting(_)
        | DatasetError::Io { .. } => 2,
        DatasetError::ConfigParse(_)
        | DatasetError::MetadataParse { .. }
        | DatasetError::ValueFileParse { .. }
        | DatasetError::LabelsParse { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let app = App::new(config);
    let sink: &dyn ProgressSink = if cli.quiet { &JsonOutput } else { &TracingSink };

    match cli.command {
        Commands::Dirs => {
            let result = app.list_dirs(sink)?;
            JsonOutput::print_dirs(&result).into_diagnostic()
        }
        Commands::Genes(args) => {
            let result = app.genes(args.list, sink)?;
            JsonOutput::print_genes(&result).into_diagnostic()
        }
        Commands::Build(args) => {
            let result = match args.source {
                BuildSource::Refinebio(flags) => app.build_refinebio(flags.into(), sink)?,
                BuildSource::Compendium(flags) => app.build_compendium(flags.into(), sink)?,
            };
            JsonOutput::print_build(&result).into_diagnostic()
        }
    }
}
