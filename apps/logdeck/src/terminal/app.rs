use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ingest::{SourceId, spawn_source};
use crate::render::style::Theme;
use crate::terminal::cli::Cli;
use crate::terminal::error::CliError;
use crate::ui::dashboard::Dashboard;
use crate::ui::runtime::{self, AppEvent};

/// Resolve the configuration, start one ingestion task per source and hand
/// the terminal to the dashboard until the user quits.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.file_config()?.compile(&cli.substitutions)?;
    info!(
        target: "logdeck::app",
        sources = config.sources.len(),
        wrap_rows = config.ui.wrap_rows,
        "starting dashboard"
    );

    let titles = config
        .sources
        .iter()
        .map(|source| source.title.clone())
        .collect();
    let dashboard = Dashboard::new(titles, config.ui, Theme::default());

    let (tx, rx) = unbounded_channel::<AppEvent>();
    let handles: Vec<JoinHandle<()>> = config
        .sources
        .into_iter()
        .enumerate()
        .map(|(index, spec)| spawn_source(SourceId(index), Arc::new(spec), tx.clone()))
        .collect();

    let result = runtime::run(dashboard, tx, rx).await;

    // dropping the tasks drops their children, which kills them
    for handle in &handles {
        handle.abort();
    }
    debug!(target: "logdeck::app", tasks = handles.len(), "ingestion tasks aborted");
    result.map_err(CliError::from)
}
