use anyhow::Result;
use clap::Parser;
use photoshop_batch::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photoshop_batch=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::Cli::parse();
    let is_silent = args.silent;

    match cli::run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if is_silent {
                // The signal file already carries the outcome; keep stderr to a
                // single line and report failure through the exit code.
                eprintln!("{e:#}");
                std::process::exit(1);
            }
            Err(e)
        }
    }
}
