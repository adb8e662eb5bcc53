use logdeck::telemetry::logging;
use logdeck::terminal::app;
use logdeck::terminal::cli::Cli;
use logdeck::terminal::error::CliError;
use tracing::debug;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::from_env_args()?;
    let log_config = cli.logging.to_config();
    logging::init(&log_config)?;
    debug!(log_level = ?log_config.level, log_file = ?log_config.file, "logging configured");
    app::run(cli).await
}
