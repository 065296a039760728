use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songplay_etl::{
    config::load_config_path,
    pipeline::{Pipeline, StageName},
    warehouse::open_warehouse,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(version, about = "Load song-play logs into a star schema")]
struct Cli {
    /// Path to the warehouse config file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SONGPLAY_ETL_CONFIG",
        default_value = "dwh.toml"
    )]
    config: String,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Load staging tables and build the star schema (default)
    Etl {
        /// Resume from this stage
        #[arg(long, value_enum)]
        from: Option<StageName>,
    },
    /// Drop and recreate all tables
    CreateTables,
    /// Recreate all tables, then load and transform
    Full {
        /// Resume from this stage
        #[arg(long, value_enum)]
        from: Option<StageName>,
    },
    /// Print the statements a run would send, without connecting
    Plan {
        /// Include the schema reset
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_path(&cli.config)
        .with_context(|| format!("loading config {}", cli.config))?;

    let (pipeline, from) = match cli.cmd.unwrap_or(Cmd::Etl { from: None }) {
        Cmd::Etl { from } => (Pipeline::etl(&config)?, from),
        Cmd::CreateTables => (Pipeline::reset(&config)?, None),
        Cmd::Full { from } => (Pipeline::full(&config)?, from),
        Cmd::Plan { reset } => {
            let pipeline = if reset {
                Pipeline::full(&config)?
            } else {
                Pipeline::etl(&config)?
            };
            for (label, text) in pipeline.render()? {
                println!("-- {label}\n{text};\n");
            }
            return Ok(());
        }
    };
    let pipeline = match from {
        Some(stage) => pipeline.starting_at(stage)?,
        None => pipeline,
    };

    info!(dialect = %pipeline.dialect(), stages = pipeline.stages().len(), "starting run");
    let mut warehouse = open_warehouse(&config)?;
    pipeline.run(warehouse.as_mut())?;

    Ok(())
}
