use crate::backend::{Credentials, Lookback, SignalType, SortOrder};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "obsterm",
    version,
    about = "Interactive terminal browser for logs, traces and metrics",
    long_about = None
)]
pub struct CliArgs {
    /// Record files to read (glob, repeatable; default: ~/.local/share/obsterm/**/*.jsonl)
    #[arg(short, long = "source", env = "OBSTERM_SOURCE", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Use the built-in synthetic data instead of files
    #[arg(long, env = "OBSTERM_DEMO")]
    pub demo: bool,

    /// Require this user:secret login on the demo backend
    #[arg(long, env = "OBSTERM_DEMO_LOGIN")]
    pub demo_login: Option<String>,

    /// Index pattern selected at startup
    #[arg(short, long, env = "OBSTERM_INDEX")]
    pub index: Option<String>,

    /// Initial lookback window (e.g. 15m, 1h, 7d)
    #[arg(short, long, env = "OBSTERM_LOOKBACK", value_parser = parse_lookback_arg)]
    pub lookback: Option<Lookback>,

    /// Seconds between automatic refreshes of the entry list
    #[arg(long = "refresh", env = "OBSTERM_REFRESH")]
    pub refresh_secs: Option<u64>,

    /// Start with automatic refresh turned off
    #[arg(long, env = "OBSTERM_NO_AUTO_REFRESH")]
    pub no_auto_refresh: bool,

    /// Signal shown at startup (logs, traces, metrics)
    #[arg(long, env = "OBSTERM_SIGNAL")]
    pub signal: Option<SignalType>,

    /// Sort entries oldest first
    #[arg(long, env = "OBSTERM_OLDEST_FIRST")]
    pub oldest_first: bool,

    /// Web UI URL template; {trace_id}, {index} and {query} are substituted
    #[arg(long, env = "OBSTERM_WEB_URL")]
    pub web_url: Option<String>,

    /// OpenTelemetry collector endpoint shown in the collector snippets
    #[arg(long, env = "OBSTERM_COLLECTOR_ENDPOINT")]
    pub collector_endpoint: Option<String>,

    /// Write diagnostics to this file (filter with OBSTERM_LOG)
    #[arg(long, env = "OBSTERM_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: ~/.config/obsterm/config.toml)
    #[arg(short, long, env = "OBSTERM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show query syntax help
    #[arg(long)]
    pub help_query: bool,
}

fn parse_lookback_arg(s: &str) -> Result<Lookback, String> {
    s.parse()
}

fn parse_login(s: &str) -> Result<Credentials, String> {
    match s.split_once(':') {
        Some((username, secret)) if !username.is_empty() => Ok(Credentials {
            username: username.to_string(),
            secret: secret.to_string(),
        }),
        _ => Err("expected user:secret".to_string()),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub sources: Vec<String>,
    pub demo: Option<bool>,
    pub demo_login: Option<String>,
    pub index: Option<String>,
    pub lookback: Option<String>,
    pub refresh_secs: Option<u64>,
    pub auto_refresh: Option<bool>,
    pub signal: Option<String>,
    pub oldest_first: Option<bool>,
    pub web_url: Option<String>,
    pub collector_endpoint: Option<String>,
    pub log_file: Option<PathBuf>,
    pub page_size: Option<usize>,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub request_secs: Option<u64>,
    pub auto_detect_secs: Option<u64>,
    pub chat_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`. A missing file is only an error when it was named
    /// explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("obsterm").join("config.toml"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub request: Duration,
    pub auto_detect: Duration,
    pub chat: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            auto_detect: Duration::from_secs(10),
            chat: Duration::from_secs(120),
        }
    }
}

/// Effective settings: command line over config file over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sources: Vec<String>,
    pub demo: bool,
    pub demo_login: Option<Credentials>,
    pub index: Option<String>,
    pub lookback: Lookback,
    pub refresh_interval: Duration,
    pub auto_refresh: bool,
    pub signal: SignalType,
    pub sort: SortOrder,
    pub web_url: Option<String>,
    pub collector_endpoint: String,
    pub log_file: Option<PathBuf>,
    pub page_size: usize,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            demo: false,
            demo_login: None,
            index: None,
            lookback: Lookback::default(),
            refresh_interval: Duration::from_secs(5),
            auto_refresh: true,
            signal: SignalType::Logs,
            sort: SortOrder::NewestFirst,
            web_url: None,
            collector_endpoint: "http://localhost:4317".to_string(),
            log_file: None,
            page_size: 500,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = match (&cli.config, default_config_path()) {
            (Some(path), _) => FileConfig::load(path, true)?,
            (None, Some(path)) => FileConfig::load(&path, false)?,
            (None, None) => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let file_lookback = file
            .lookback
            .as_deref()
            .map(str::parse::<Lookback>)
            .transpose()
            .map_err(|message| ConfigError::Invalid {
                key: "lookback",
                message,
            })?;
        let file_signal = file
            .signal
            .as_deref()
            .map(str::parse::<SignalType>)
            .transpose()
            .map_err(|message| ConfigError::Invalid {
                key: "signal",
                message,
            })?;

        let demo_login = cli
            .demo_login
            .as_deref()
            .or(file.demo_login.as_deref())
            .map(parse_login)
            .transpose()
            .map_err(|message| ConfigError::Invalid {
                key: "demo_login",
                message,
            })?;

        let refresh_secs = cli.refresh_secs.or(file.refresh_secs);
        if refresh_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "refresh",
                message: "must be at least one second".to_string(),
            });
        }
        let page_size = file.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                message: "must be positive".to_string(),
            });
        }

        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };

        Ok(Self {
            sources: if cli.sources.is_empty() {
                file.sources
            } else {
                cli.sources.clone()
            },
            demo: cli.demo || file.demo.unwrap_or(defaults.demo),
            demo_login,
            index: cli.index.clone().or(file.index),
            lookback: cli.lookback.or(file_lookback).unwrap_or(defaults.lookback),
            refresh_interval: secs(refresh_secs, defaults.refresh_interval),
            auto_refresh: !cli.no_auto_refresh && file.auto_refresh.unwrap_or(defaults.auto_refresh),
            signal: cli.signal.or(file_signal).unwrap_or(defaults.signal),
            sort: if cli.oldest_first || file.oldest_first.unwrap_or(false) {
                SortOrder::OldestFirst
            } else {
                SortOrder::NewestFirst
            },
            web_url: cli.web_url.clone().or(file.web_url),
            collector_endpoint: cli
                .collector_endpoint
                .clone()
                .or(file.collector_endpoint)
                .unwrap_or(defaults.collector_endpoint),
            log_file: cli.log_file.clone().or(file.log_file),
            page_size,
            timeouts: Timeouts {
                request: secs(file.timeouts.request_secs, defaults.timeouts.request),
                auto_detect: secs(file.timeouts.auto_detect_secs, defaults.timeouts.auto_detect),
                chat: secs(file.timeouts.chat_secs, defaults.timeouts.chat),
            },
        })
    }
}
