//! CLI-owned configuration: TOML file plus `VELOCACHE_` environment
//! variables, resolved against command-line flags.
//!
//! Core never sees these types -- it receives a pre-built `MonitorConfig`.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use velocache_core::MonitorConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

// ── TOML config struct ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Management server base URL.
    pub server: Option<String>,

    /// Default output format: "table", "json", or "plain".
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "velocache", "velocache")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("velocache");
            p.push("config.toml");
            p
        })
}

// ── Config loading ───────────────────────────────────────────────────

/// Load the config from file + environment, falling back to defaults when
/// the file does not exist.
pub fn load_config() -> Result<Config, CliError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("VELOCACHE_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Resolution (flag > env > file > default) ─────────────────────────

pub fn resolve_server(global: &GlobalOpts, config: &Config) -> Result<url::Url, CliError> {
    let raw = global
        .server
        .as_deref()
        .or(config.server.as_deref())
        .unwrap_or(DEFAULT_SERVER);

    raw.parse().map_err(|_| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

pub fn resolve_output(global: &GlobalOpts, config: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    match config.output.as_str() {
        "table" => Ok(OutputFormat::Table),
        "json" => Ok(OutputFormat::Json),
        "plain" => Ok(OutputFormat::Plain),
        other => Err(CliError::Validation {
            field: "output".into(),
            reason: format!("expected 'table', 'json', or 'plain', got '{other}'"),
        }),
    }
}

pub fn resolve_timeout(global: &GlobalOpts, config: &Config) -> Duration {
    Duration::from_secs(global.timeout.unwrap_or(config.timeout))
}

/// Build a core `MonitorConfig` for commands that run the full monitor.
pub fn build_monitor_config(global: &GlobalOpts, config: &Config) -> Result<MonitorConfig, CliError> {
    let server = resolve_server(global, config)?;
    let mut monitor = MonitorConfig::new(server);
    monitor.transport.timeout = resolve_timeout(global, config);
    Ok(monitor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn global() -> GlobalOpts {
        GlobalOpts {
            server: None,
            output: None,
            timeout: None,
            verbose: 0,
        }
    }

    #[test]
    fn flag_beats_config_server() {
        let config = Config {
            server: Some("http://cache.lan:9090".into()),
            ..Config::default()
        };
        let mut opts = global();
        opts.server = Some("http://10.0.0.2:8080".into());

        let url = resolve_server(&opts, &config).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8080/");
    }

    #[test]
    fn default_server_is_localhost() {
        let url = resolve_server(&global(), &Config::default()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn bad_output_string_is_rejected() {
        let config = Config {
            output: "xml".into(),
            ..Config::default()
        };
        assert!(matches!(
            resolve_output(&global(), &config),
            Err(CliError::Validation { .. })
        ));
    }
}
