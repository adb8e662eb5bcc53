use crate::config::ConfigError;
use crate::telemetry::logging::InitError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("logging initialization failed: {0}")]
    Logging(#[from] InitError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
