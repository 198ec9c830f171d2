use anyhow::Result;
use winstack_cli::argparse::parse_args;
use winstack_cli::commands::{connect, handle_command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = connect(&cli).await?;
    let listing = handle_command(&client, cli.region.as_deref(), &cli.command).await?;
    listing.print(cli.json);
    Ok(())
}
