use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind};
use dungeon_gen::{
    DungeonBuilder, GeneratorConfig, ReactivationPolicy, Report, VariableSpec, validate_request,
};
use rand::{SeedableRng, rngs::StdRng};

/// Generates the structure of a state-gated puzzle dungeon
#[derive(Debug, Parser)]
#[command(name = "dungeon_gen", version)]
struct Cli {
    /// State variables in build order: `r<N>` is reversible, `i<N>` is irreversible, N is the
    /// number of values (e.g. `r2 i2 r5`)
    #[arg(required = true)]
    variables: Vec<VariableSpec>,

    /// Seed for the random generator. A random seed is used if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Operating a reversible mechanism always changes its value
    #[arg(long)]
    must_change: bool,

    /// Gates to new enclaves can only be crossed in one direction
    #[arg(long)]
    one_way_gates: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> eyre::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = validate_request(&cli.variables) {
        Cli::command().error(ErrorKind::ValueValidation, err).exit();
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!("generating {} variables with seed {seed}", cli.variables.len());

    let config = GeneratorConfig::default()
        .with_reactivation(if cli.must_change {
            ReactivationPolicy::MustChange
        } else {
            ReactivationPolicy::MayRepeat
        })
        .with_one_way_gates(cli.one_way_gates);

    let generated =
        DungeonBuilder::new(&cli.variables, config, StdRng::seed_from_u64(seed))?.build()?;

    let report = Report::new(&generated).with_seed(seed);
    match cli.format {
        Format::Text => print!("{report}"),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
