use clap::Parser;
use tracing_subscriber::EnvFilter;

use commentbox::cli::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("COMMENTBOX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    commentbox::run(Cli::parse())
}
