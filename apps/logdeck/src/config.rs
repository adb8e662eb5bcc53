use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "logdeck.json";
pub const CONFIG_ENV: &str = "LOGDECK_CONFIG";

/// Entry boundary used by `--inline` when no pattern is given: any line that
/// does not start with whitespace opens a new entry.
pub const DEFAULT_ENTRY_PATTERN: &str = r"^\S";

const LIST_PERCENT_RANGE: std::ops::RangeInclusive<u16> = 10..=90;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no log sources configured")]
    NoSources,
    #[error("source `{title}` has an empty command")]
    EmptyCommand { title: String },
    #[error("source `{title}` has an invalid entry_pattern: {source}")]
    InvalidPattern {
        title: String,
        #[source]
        source: regex::Error,
    },
    #[error("ui.list_percent must be within 10..=90 (got {0})")]
    ListPercent(u16),
}

/// On-disk shape of the configuration file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub logs: Vec<LogSourceConfig>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LogSourceConfig {
    pub title: String,
    pub command: CommandLine,
    pub entry_pattern: String,
}

/// Either a whitespace separated command string or an explicit argument
/// vector. Neither form goes through a shell.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CommandLine {
    Line(String),
    Argv(Vec<String>),
}

impl CommandLine {
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            CommandLine::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            CommandLine::Argv(argv) => argv.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Wrap long entry headers in the list instead of truncating them.
    pub wrap_rows: bool,
    /// Share of the body width given to the entry list.
    pub list_percent: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            wrap_rows: true,
            list_percent: 33,
        }
    }
}

/// A validated source, ready to spawn.
#[derive(Clone, Debug)]
pub struct SourceSpec {
    pub title: String,
    pub argv: Vec<String>,
    pub entry_pattern: Regex,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub sources: Vec<SourceSpec>,
    pub ui: UiConfig,
}

impl FileConfig {
    /// Read a config file. Paths ending in `.toml` are parsed as TOML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            toml::from_str(&raw).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };
        debug!(target: "logdeck::config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Single-source config built from the command line.
    pub fn inline(command: &str, title: Option<&str>, entry_pattern: &str) -> Self {
        Self {
            logs: vec![LogSourceConfig {
                title: title.unwrap_or(command).to_string(),
                command: CommandLine::Line(command.to_string()),
                entry_pattern: entry_pattern.to_string(),
            }],
            ui: UiConfig::default(),
        }
    }

    /// Apply placeholder substitutions and validate every source.
    pub fn compile(self, substitutions: &HashMap<String, String>) -> Result<Config, ConfigError> {
        if self.logs.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if !LIST_PERCENT_RANGE.contains(&self.ui.list_percent) {
            return Err(ConfigError::ListPercent(self.ui.list_percent));
        }
        let sources = self
            .logs
            .into_iter()
            .map(|log| log.compile(substitutions))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Config {
            sources,
            ui: self.ui,
        })
    }
}

impl LogSourceConfig {
    fn compile(self, substitutions: &HashMap<String, String>) -> Result<SourceSpec, ConfigError> {
        let argv: Vec<String> = self
            .command
            .to_argv()
            .iter()
            .map(|arg| substitute_placeholders(arg, substitutions))
            .collect();
        if argv.first().is_none_or(|program| program.is_empty()) {
            return Err(ConfigError::EmptyCommand { title: self.title });
        }
        let entry_pattern =
            Regex::new(&self.entry_pattern).map_err(|source| ConfigError::InvalidPattern {
                title: self.title.clone(),
                source,
            })?;
        Ok(SourceSpec {
            title: self.title,
            argv,
            entry_pattern,
        })
    }
}

/// Replace every `${name}` whose name is in `substitutions`. Unknown or
/// unterminated placeholders are kept as written.
pub fn substitute_placeholders(text: &str, substitutions: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match substitutions.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn source(title: &str, command: CommandLine, pattern: &str) -> LogSourceConfig {
        LogSourceConfig {
            title: title.to_string(),
            command,
            entry_pattern: pattern.to_string(),
        }
    }

    #[test_timeout::timeout]
    fn placeholders_are_replaced() {
        let values = subs(&[("env", "prod"), ("pod", "api-1")]);
        assert_eq!(
            substitute_placeholders("logs/${env}/${pod}.log", &values),
            "logs/prod/api-1.log"
        );
        assert_eq!(substitute_placeholders("${env}${env}", &values), "prodprod");
    }

    #[test_timeout::timeout]
    fn unknown_placeholders_stay_verbatim() {
        let values = subs(&[("env", "prod")]);
        assert_eq!(substitute_placeholders("${region}-${env}", &values), "${region}-prod");
        assert_eq!(substitute_placeholders("tail ${env", &values), "tail ${env");
        assert_eq!(substitute_placeholders("$env {env}", &values), "$env {env}");
    }

    #[test_timeout::timeout]
    fn command_forms_parse() {
        let json = r#"{
            "logs": [
                {"title": "api", "command": "kubectl logs -f ${pod}", "entry_pattern": "^\\d"},
                {"title": "db", "command": ["tail", "-F", "/var/log/db log"], "entry_pattern": "^\\["}
            ]
        }"#;
        let config: FileConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(
            config.logs[0].command,
            CommandLine::Line("kubectl logs -f ${pod}".to_string())
        );
        assert_eq!(
            config.logs[1].command.to_argv(),
            vec!["tail", "-F", "/var/log/db log"]
        );
        assert_eq!(config.ui, UiConfig::default());

        let compiled = config.compile(&subs(&[("pod", "web-0")])).expect("compile");
        assert_eq!(compiled.sources[0].argv, vec!["kubectl", "logs", "-f", "web-0"]);
        assert!(compiled.sources[1].entry_pattern.is_match("[db] ready"));
    }

    #[test_timeout::timeout]
    fn ui_section_is_optional_per_field() {
        let json = r#"{"logs": [], "ui": {"wrap_rows": false}}"#;
        let config: FileConfig = serde_json::from_str(json).expect("parse");
        assert!(!config.ui.wrap_rows);
        assert_eq!(config.ui.list_percent, 33);
    }

    #[test_timeout::timeout]
    fn invalid_pattern_names_the_source() {
        let config = FileConfig {
            logs: vec![source("broken", CommandLine::Line("cat".into()), "(unclosed")],
            ui: UiConfig::default(),
        };
        match config.compile(&HashMap::new()) {
            Err(ConfigError::InvalidPattern { title, .. }) => assert_eq!(title, "broken"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test_timeout::timeout]
    fn validation_errors() {
        assert!(matches!(
            FileConfig::default().compile(&HashMap::new()),
            Err(ConfigError::NoSources)
        ));

        let blank = FileConfig {
            logs: vec![source("blank", CommandLine::Line("   ".into()), ".")],
            ui: UiConfig::default(),
        };
        assert!(matches!(
            blank.compile(&HashMap::new()),
            Err(ConfigError::EmptyCommand { .. })
        ));

        let placeholder_only = FileConfig {
            logs: vec![source("empty", CommandLine::Argv(vec!["${bin}".into()]), ".")],
            ui: UiConfig::default(),
        };
        assert!(matches!(
            placeholder_only.compile(&subs(&[("bin", "")])),
            Err(ConfigError::EmptyCommand { .. })
        ));

        let narrow = FileConfig {
            logs: vec![source("a", CommandLine::Line("cat".into()), ".")],
            ui: UiConfig {
                wrap_rows: true,
                list_percent: 95,
            },
        };
        assert!(matches!(
            narrow.compile(&HashMap::new()),
            Err(ConfigError::ListPercent(95))
        ));
    }

    #[test_timeout::timeout]
    fn inline_source_defaults_title_to_command() {
        let config = FileConfig::inline("journalctl -f", None, DEFAULT_ENTRY_PATTERN)
            .compile(&HashMap::new())
            .expect("compile");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].title, "journalctl -f");
        assert_eq!(config.sources[0].argv, vec!["journalctl", "-f"]);
        assert!(config.sources[0].entry_pattern.is_match("Oct 19 boot"));
        assert!(!config.sources[0].entry_pattern.is_match("  indented"));
    }
}
