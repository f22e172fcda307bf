use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use calendarIndicator::cli::Args;
use calendarIndicator::config;
use calendarIndicator::runtime;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("calendarIndicator=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match config::load_or_prompt(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "cannot start without a valid config");
            return Err(err.into());
        }
    };

    runtime::run(args, config).await
}
