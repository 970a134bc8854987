#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use survey_guru::export::ExportFormats;
use survey_guru::loader::DefinitionFormats;
use survey_guru::population::{
    to_export_rows_with, AnswerMode, HeaderStyle, Population, SimulationConfig,
};
use survey_guru::strategy::StrategyRegistry;

const DEFAULT_POPULATION: i64 = 100;

#[derive(Parser)]
#[command(
    name = "surveyguru",
    version,
    about = "Generate synthetic survey responses from a question-influence graph"
)]
struct Cli {
    /// Survey definition file (.json, .yaml, .yml)
    #[arg(required_unless_present = "list_strategies")]
    input: Option<PathBuf>,

    /// Number of respondents to simulate
    #[arg(short = 'n', long, allow_negative_numbers = true, default_value_t = DEFAULT_POPULATION)]
    population: i64,

    /// Destination file (.csv, .tsv, .json); defaults to a timestamped CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Simulation config JSON; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Question ordering strategy (see --list-strategies)
    #[arg(long)]
    ordering: Option<String>,

    /// Option sampling strategy (see --list-strategies)
    #[arg(long)]
    sampling: Option<String>,

    /// Clamp on the absolute accumulated effect (0-99)
    #[arg(long, conflicts_with = "no_effect_limit")]
    effect_limit: Option<i64>,

    /// Disable effect clamping; strong influence then fails the run
    #[arg(long)]
    no_effect_limit: bool,

    /// Simulate respondents in parallel
    #[arg(long)]
    parallel: bool,

    /// Answer uniformly at random, ignoring connections
    #[arg(long)]
    uniform: bool,

    /// Column labels in the output
    #[arg(long, value_enum, default_value = "id")]
    header: CliHeader,

    /// Print the registered strategy names and exit
    #[arg(long)]
    list_strategies: bool,

    /// Log at debug level unless SURVEYGURU_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliHeader {
    Id,
    Text,
}

impl From<CliHeader> for HeaderStyle {
    fn from(h: CliHeader) -> Self {
        match h {
            CliHeader::Id => HeaderStyle::Id,
            CliHeader::Text => HeaderStyle::Text,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = StrategyRegistry::default();
    if cli.list_strategies {
        for name in registry.list_orderings() {
            let about = registry.ordering(&name)?.describe().unwrap_or_default();
            println!("ordering\t{name}\t{about}");
        }
        for name in registry.list_samplers() {
            let about = registry.sampler(&name)?.describe().unwrap_or_default();
            println!("sampling\t{name}\t{about}");
        }
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .ok_or("an input definition file is required")?;
    let config = resolve_config(&cli)?;

    let survey = DefinitionFormats::default().load_survey(input)?;
    let population = Population::from_config(&survey, config, &registry)?;
    let forms = population.simulate(cli.population)?;
    info!(respondents = forms.len(), "simulation finished");

    let table = to_export_rows_with(&forms, cli.header.into())?;
    let output = cli.output.clone().unwrap_or_else(default_output);
    ExportFormats::default().write(&output, &table)?;
    println!("{}", output.display());
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }
    if let Some(ordering) = &cli.ordering {
        config.ordering = ordering.clone();
    }
    if let Some(sampling) = &cli.sampling {
        config.sampling = sampling.clone();
    }
    if let Some(limit) = cli.effect_limit {
        config.effect_limit = Some(limit);
    }
    if cli.no_effect_limit {
        config.effect_limit = None;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.uniform {
        config.mode = AnswerMode::Uniform;
    }
    Ok(config)
}

fn default_output() -> PathBuf {
    PathBuf::from(chrono::Local::now().format("%Y%m%d%H%M%S.csv").to_string())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "surveyguru=debug,survey_guru=debug"
    } else {
        "surveyguru=info,survey_guru=info"
    };
    let filter = EnvFilter::try_from_env("SURVEYGURU_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
