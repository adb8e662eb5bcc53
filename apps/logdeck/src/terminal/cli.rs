use clap::{Args, CommandFactory, Parser};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::config::{ConfigError, DEFAULT_CONFIG_PATH, DEFAULT_ENTRY_PATTERN, FileConfig};
use crate::telemetry::logging::{LogConfig, LogLevel};
use crate::terminal::error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "logdeck",
    about = "📜 Tail several log-producing commands in one terminal dashboard",
    author,
    version,
    after_help = "Any other --key value (or --key=value) pair replaces ${key} in the configured commands."
)]
pub struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        env = "LOGDECK_CONFIG",
        help = "Config file (JSON, or TOML when the name ends in .toml) [default: logdeck.json]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "inline",
        value_name = "COMMAND",
        help = "Tail a single command instead of reading a config file"
    )]
    pub inline: Option<String>,

    #[arg(
        long = "title",
        value_name = "TITLE",
        requires = "inline",
        help = "Tab title for --inline (defaults to the command)"
    )]
    pub title: Option<String>,

    #[arg(
        long = "pattern",
        value_name = "REGEX",
        default_value = DEFAULT_ENTRY_PATTERN,
        help = "Entry pattern for --inline"
    )]
    pub pattern: String,

    #[command(flatten)]
    pub logging: LoggingArgs,

    /// `${name}` replacements collected from the remaining `--key value`
    /// pairs.
    #[arg(skip)]
    pub substitutions: HashMap<String, String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "LOGDECK_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "LOGDECK_LOG_FILE",
        help = "Write logs to the specified file (logs are discarded otherwise)"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

impl Cli {
    /// Parse the process arguments, pulling out substitution pairs first.
    pub fn from_env_args() -> Result<Self, CliError> {
        let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
        let (args, substitutions) = split_substitutions(args)?;
        let mut cli = Cli::parse_from(args);
        cli.substitutions = substitutions;
        Ok(cli)
    }

    /// The file config this invocation asks for: the inline source when
    /// given, otherwise the config file.
    pub fn file_config(&self) -> Result<FileConfig, ConfigError> {
        if let Some(command) = self.inline.as_deref() {
            return Ok(FileConfig::inline(command, self.title.as_deref(), &self.pattern));
        }
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        FileConfig::load(&path)
    }
}

fn known_long_flags() -> HashSet<String> {
    let command = Cli::command();
    let mut flags: HashSet<String> = command
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .map(str::to_string)
        .collect();
    flags.insert("help".to_string());
    flags.insert("version".to_string());
    flags
}

/// Separate `--key value` / `--key=value` pairs that are not our own flags.
/// The program name and everything after `--` pass through untouched.
pub fn split_substitutions<I>(args: I) -> Result<(Vec<String>, HashMap<String, String>), CliError>
where
    I: IntoIterator<Item = String>,
{
    let known = known_long_flags();
    let mut args = args.into_iter();
    let mut kept: Vec<String> = args.next().into_iter().collect();
    let mut substitutions = HashMap::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            kept.push(arg);
            kept.extend(args);
            break;
        }
        let Some(flag) = arg.strip_prefix("--") else {
            kept.push(arg);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (flag.to_string(), None),
        };
        if known.contains(&name) {
            kept.push(arg);
            continue;
        }
        let value = match inline_value {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| CliError::InvalidArgument(format!("missing value for --{name}")))?,
        };
        substitutions.insert(name, value);
    }
    Ok((kept, substitutions))
}
