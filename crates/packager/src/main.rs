use clap::Parser;
use packager::{cli::Cli, package};
use shared::{configure_tracing, load_dotenv};
use tracing::debug;

fn main() -> Result<(), anyhow::Error> {
    load_dotenv()?;
    configure_tracing();

    let args = Cli::parse();
    debug!(?args);

    package(&args)?;

    Ok(())
}
