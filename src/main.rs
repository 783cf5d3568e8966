use anyhow::Result;
use clap::Parser;
use enforcer::cli::{Cli, Commands};
use enforcer::commands::{self, AnalyzeArgs, RepairArgs};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            conceptual,
            smells,
            fail_on,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), &commands::search_start(&paths));
            let failed = commands::handle_analyze(
                &config,
                AnalyzeArgs {
                    paths,
                    format: format.into(),
                    output,
                    conceptual,
                    smells,
                    fail_on: fail_on.map(Into::into),
                },
            )?;
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Smells { paths, format } => {
            let config = commands::resolve_config(cli.config.as_deref(), &commands::search_start(&paths));
            commands::handle_smells(&config, &paths, format.into())?;
        }
        Commands::Hunt { file, json } => commands::handle_hunt(&file, json)?,
        Commands::Repair {
            paths,
            apply,
            yes,
            store,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), &commands::search_start(&paths));
            commands::handle_repair(
                &config,
                RepairArgs {
                    paths,
                    apply,
                    yes,
                    store,
                },
            )?;
        }
        Commands::Init { force } => commands::init_config(Path::new("."), force)?,
        Commands::Learn { store, json } => {
            let config = commands::resolve_config(cli.config.as_deref(), Path::new("."));
            commands::handle_learn(&config, store, json)?;
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise `-v` counts pick the level.
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
