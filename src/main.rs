use clap::Parser;
use schema_forms::cli::commands::{cmd_check, cmd_steps, cmd_submit, cmd_validate};
use schema_forms::cli::config::{Cli, Commands, load_config, log_level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    let ok = match cli.command {
        Commands::Check { schema } => cmd_check(&schema)?,
        Commands::Steps {
            schema,
            per_step,
            steps,
        } => cmd_steps(&schema, per_step, steps.as_deref(), &config)?,
        Commands::Validate {
            schema,
            values,
            step,
        } => cmd_validate(&schema, &values, step, &config)?,
        Commands::Submit {
            schema,
            values,
            output,
        } => {
            cmd_submit(
                &schema,
                &values,
                output.as_deref(),
                cli.trace.as_deref(),
                &config,
            )
            .await?
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

/// RUST_LOG wins over the -v count.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
