use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

fn env_truthy(var: &str) -> Option<bool> {
    std::env::var(var).map(|v| v != "0" && !v.is_empty()).ok()
}

static PERF_ENABLED: Lazy<bool> = Lazy::new(|| env_truthy("LOGDECK_PERF").unwrap_or(false));

static STATS: Lazy<Mutex<HashMap<&'static str, PerfStat>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

static GAUGES: Lazy<Mutex<HashMap<&'static str, GaugeStat>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

const DURATION_REPORT_EVERY: u64 = 200;
const GAUGE_REPORT_EVERY: u64 = 200;

#[derive(Default)]
struct GaugeStat {
    last: u64,
    max: u64,
    samples: u64,
}

#[derive(Default)]
struct PerfStat {
    total_ns: u128,
    max_ns: u128,
    count: u64,
}

pub fn enabled() -> bool {
    *PERF_ENABLED
}

pub fn record_duration(label: &'static str, duration: Duration) {
    if !enabled() {
        return;
    }
    let Ok(mut stats) = STATS.lock() else {
        return;
    };
    let entry = stats.entry(label).or_default();
    entry.add(duration);
    if entry.count % DURATION_REPORT_EVERY == 0 {
        report_stat(label, entry);
    }
}

/// Track a sampled quantity, e.g. how many events were coalesced into one
/// frame.
pub fn record_gauge(label: &'static str, value: u64) {
    if !enabled() {
        return;
    }
    let Ok(mut gauges) = GAUGES.lock() else {
        return;
    };
    let entry = gauges.entry(label).or_default();
    entry.last = value;
    entry.max = entry.max.max(value);
    entry.samples = entry.samples.saturating_add(1);
    if entry.samples % GAUGE_REPORT_EVERY == 0 {
        debug!(
            target: "logdeck::perf",
            label,
            last = entry.last,
            max = entry.max,
            samples = entry.samples,
            "gauge"
        );
    }
}

impl PerfStat {
    fn add(&mut self, duration: Duration) {
        let nanos = duration.as_nanos();
        self.count += 1;
        self.total_ns += nanos;
        self.max_ns = self.max_ns.max(nanos);
    }

    fn average_us(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.total_ns / u128::from(self.count)) as f64 / 1_000.0
    }
}

fn report_stat(label: &'static str, stat: &PerfStat) {
    let avg_us = stat.average_us();
    let max_us = stat.max_ns as f64 / 1_000.0;
    debug!(
        target: "logdeck::perf",
        label,
        count = stat.count,
        avg_us,
        max_us,
        "timing"
    );
}

/// Records the time between construction and drop under `label`.
pub struct PerfGuard {
    label: &'static str,
    start: Instant,
}

impl PerfGuard {
    pub fn new(label: &'static str) -> Option<Self> {
        if !enabled() {
            return None;
        }
        Some(Self {
            label,
            start: Instant::now(),
        })
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        record_duration(self.label, self.start.elapsed());
    }
}

pub mod logging {
    use clap::ValueEnum;
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
    use tracing_subscriber::EnvFilter;

    pub const FILTER_ENV: &str = "LOGDECK_LOG_FILTER";

    #[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
    pub enum LogLevel {
        Error,
        #[default]
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl LogLevel {
        pub fn as_str(self) -> &'static str {
            match self {
                LogLevel::Error => "error",
                LogLevel::Warn => "warn",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        }
    }

    /// Where logs go. Without a file logging stays off: the dashboard owns the
    /// terminal and anything written to stderr would corrupt the screen.
    #[derive(Clone, Debug, Default)]
    pub struct LogConfig {
        pub level: LogLevel,
        pub file: Option<PathBuf>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum InitError {
        #[error("failed to open log file {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error("failed to configure logger: {0}")]
        Configure(String),
    }

    static INIT: OnceLock<()> = OnceLock::new();
    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    pub fn init(config: &LogConfig) -> Result<(), InitError> {
        if INIT.get().is_some() {
            return Ok(());
        }

        inner_init(config)?;
        INIT.set(()).ok();
        Ok(())
    }

    fn inner_init(config: &LogConfig) -> Result<(), InitError> {
        let Some((writer, guard)) = open_writer(config)? else {
            return Ok(());
        };
        let env_filter = build_env_filter(config.level);

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_level(true)
            .with_target(config.level >= LogLevel::Debug)
            .with_thread_names(config.level >= LogLevel::Trace)
            .with_ansi(false)
            .with_writer(writer)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| InitError::Configure(err.to_string()))?;

        let _ = GUARD.set(guard);
        Ok(())
    }

    /// Non-blocking writer for the log file. Without a file there is nothing
    /// to write to, so no subscriber or worker thread is installed.
    fn open_writer(config: &LogConfig) -> Result<Option<(NonBlocking, WorkerGuard)>, InitError> {
        let Some(path) = &config.file else {
            return Ok(None);
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| InitError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Some(tracing_appender::non_blocking(file)))
    }

    fn build_env_filter(level: LogLevel) -> EnvFilter {
        match std::env::var(FILTER_ENV) {
            Ok(filter) => EnvFilter::new(filter),
            Err(_) => EnvFilter::new(default_filter_for(level)),
        }
    }

    /// Dependencies stay at `info` even when our own targets are turned up.
    pub(crate) fn default_filter_for(level: LogLevel) -> String {
        if level >= LogLevel::Debug {
            format!("info,logdeck={}", level.as_str())
        } else {
            level.as_str().to_owned()
        }
    }

}
