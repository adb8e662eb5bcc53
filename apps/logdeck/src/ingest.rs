use std::process::Stdio;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SourceSpec;
use crate::store::IngestedLine;

/// Position of a source in the configuration; also its tab index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

/// Everything an ingestion task reports to the coordinator. The coordinator
/// is the only place these are applied, so the tasks never touch shared
/// state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceEvent {
    Started { source: SourceId, pid: Option<u32> },
    Line { source: SourceId, line: IngestedLine },
    Exited { source: SourceId, code: Option<i32> },
    Failed { source: SourceId, error: String },
}

impl SourceEvent {
    pub fn source(&self) -> SourceId {
        match self {
            SourceEvent::Started { source, .. }
            | SourceEvent::Line { source, .. }
            | SourceEvent::Exited { source, .. }
            | SourceEvent::Failed { source, .. } => *source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("source has an empty command")]
    EmptyCommand,
    #[error("failed to start `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{0}` has no stdout pipe")]
    MissingStdout(String),
}

pub fn classify(pattern: &Regex, line: String) -> IngestedLine {
    if pattern.is_match(&line) {
        IngestedLine::Start(line)
    } else {
        IngestedLine::Continuation(line)
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Read `reader` to the end, forwarding each classified line. Stops early
/// once the receiving side is gone. Returns the number of lines forwarded.
pub async fn pump_lines<R, E>(
    source: SourceId,
    pattern: &Regex,
    reader: R,
    tx: &UnboundedSender<E>,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    E: From<SourceEvent>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut forwarded = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = classify(pattern, decode_line(&buf));
        if tx.send(SourceEvent::Line { source, line }.into()).is_err() {
            debug!(target: "logdeck::ingest", source = source.0, "receiver closed; stop reading");
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

/// Launch the source's command with stdout piped. Stdin and stderr are
/// detached; the child is killed when its handle is dropped.
pub fn start_process(spec: &SourceSpec) -> Result<Child, SpawnError> {
    let (program, args) = spec.argv.split_first().ok_or(SpawnError::EmptyCommand)?;
    let mut command = TokioCommand::new(program);
    command.args(args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::null());
    command.kill_on_drop(true);
    command.spawn().map_err(|source| SpawnError::Io {
        program: program.clone(),
        source,
    })
}

/// Spawn the ingestion task for one source. The task ends when the process
/// exits or the receiver is dropped; it never restarts the process.
pub fn spawn_source<E>(source: SourceId, spec: Arc<SourceSpec>, tx: UnboundedSender<E>) -> JoinHandle<()>
where
    E: From<SourceEvent> + Send + 'static,
{
    tokio::spawn(async move { run_source(source, &spec, &tx).await })
}

async fn run_source<E>(source: SourceId, spec: &SourceSpec, tx: &UnboundedSender<E>)
where
    E: From<SourceEvent>,
{
    let mut child = match start_process(spec) {
        Ok(child) => child,
        Err(err) => {
            warn!(target: "logdeck::ingest", source = %spec.title, error = %err, "source failed to start");
            let _ = tx.send(
                SourceEvent::Failed {
                    source,
                    error: err.to_string(),
                }
                .into(),
            );
            return;
        }
    };

    let pid = child.id();
    info!(target: "logdeck::ingest", source = %spec.title, pid = ?pid, argv = ?spec.argv, "source started");
    if tx.send(SourceEvent::Started { source, pid }.into()).is_err() {
        return;
    }

    let Some(stdout) = child.stdout.take() else {
        let err = SpawnError::MissingStdout(spec.title.clone());
        let _ = tx.send(
            SourceEvent::Failed {
                source,
                error: err.to_string(),
            }
            .into(),
        );
        return;
    };

    match pump_lines(source, &spec.entry_pattern, stdout, tx).await {
        Ok(lines) => debug!(target: "logdeck::ingest", source = %spec.title, lines, "stdout closed"),
        Err(err) => warn!(target: "logdeck::ingest", source = %spec.title, error = %err, "failed to read source output"),
    }
    if tx.is_closed() {
        return;
    }

    let code = match child.wait().await {
        Ok(status) => status.code(),
        Err(err) => {
            warn!(target: "logdeck::ingest", source = %spec.title, error = %err, "failed to reap source");
            None
        }
    };
    info!(target: "logdeck::ingest", source = %spec.title, code = ?code, "source exited");
    let _ = tx.send(SourceEvent::Exited { source, code }.into());
}
