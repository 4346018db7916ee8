//! Command-line and environment configuration.

use std::path::PathBuf;
use thiserror::Error;
use vd_core::{ConnectorMode, LayoutConfig, Template};

/// Environment variable naming the file store directory.
pub const STORE_DIR_ENV: &str = "VD_STORE_DIR";

pub const USAGE: &str = "\
usage: vd-server [--store <dir>] [--fixed-connectors]
       vd-server --generate \"A -> B, B -> C\"
       vd-server --template flow|mindmap

With no mode flag, serves JSON-RPC on stdin/stdout.
Documents live in memory unless --store or VD_STORE_DIR names a directory.";

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// JSON-RPC over stdio.
    Serve,
    /// Print the shape batch for an edge list and exit.
    Generate(String),
    /// Print the shape batch for a template and exit.
    Template(Template),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub mode: Mode,
    /// Directory for the file store; `None` keeps documents in memory.
    pub store_dir: Option<PathBuf>,
    pub layout: LayoutConfig,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} needs a value")]
    MissingValue(&'static str),
    #[error("{0}")]
    UnknownTemplate(String),
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

impl ServerConfig {
    /// Read the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Parse `args` (without the program name). `env` looks up variables.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut mode = Mode::Serve;
        let mut store_dir = None;
        let mut layout = LayoutConfig::default();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => {
                    let dir = args.next().ok_or(ConfigError::MissingValue("--store"))?;
                    store_dir = Some(PathBuf::from(dir));
                }
                "--generate" => {
                    mode = Mode::Generate(args.next().ok_or(ConfigError::MissingValue("--generate"))?);
                }
                "--template" => {
                    let name = args.next().ok_or(ConfigError::MissingValue("--template"))?;
                    mode = Mode::Template(name.parse().map_err(ConfigError::UnknownTemplate)?);
                }
                "--fixed-connectors" => layout.connector_mode = ConnectorMode::Fixed,
                "-h" | "--help" => mode = Mode::Help,
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        if store_dir.is_none() {
            store_dir = env(STORE_DIR_ENV).filter(|s| !s.is_empty()).map(PathBuf::from);
        }

        Ok(Self {
            mode,
            store_dir,
            layout,
        })
    }
}
