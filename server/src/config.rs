use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use json_parser::{JsonError, JsonParser, JsonValue};
use logger::{ConsoleLogTarget, FileLogTarget, LogLevel, LogTarget};
use http_server::SessionSettings;

/// Base64 document decoder service
#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Address to bind, overrides `server.ip-address`
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind, overrides `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogTargetKind {
    Console,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ip: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub max_body_bytes: usize,
    pub pool_size: usize,
    pub log_level: LogLevel,
    pub log_target: LogTargetKind,
    pub capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionSettings::default();
        Self {
            ip: "0.0.0.0".to_string(),
            port: 5000,
            read_timeout: session.read_timeout,
            max_body_bytes: session.max_body_bytes,
            pool_size: 1,
            log_level: LogLevel::Info,
            log_target: LogTargetKind::Console,
            capacity: 1,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file is missing or
    /// unreadable. Problems are logged, never fatal.
    pub fn load(path: &Path) -> Config {
        let raw_config = match fs::read_to_string(path) {
            Ok(raw_config) => raw_config,
            Err(err) => {
                logger::warn!("Could not read {}: {}, using defaults", path.display(), err);
                return Config::default();
            }
        };

        match Config::from_json(&raw_config) {
            Ok(config) => config,
            Err(err) => {
                logger::warn!("Could not parse {}: {}, using defaults", path.display(), err);
                Config::default()
            }
        }
    }

    pub fn from_json(raw_config: &str) -> Result<Config, JsonError> {
        let mut parser = JsonParser::new()?;
        let config_obj = parser.parse(raw_config)?;
        let defaults = Config::default();

        let server = &config_obj["server"];
        let logging = &config_obj["logging"];

        let ip = server["ip-address"].as_str().map(str::to_string).unwrap_or(defaults.ip);
        let port = number_or(&server["port"], defaults.port as f64) as u16;
        let read_timeout = server["read-timeout-secs"].as_number()
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(defaults.read_timeout);
        let max_body_bytes = number_or(&server["max-body-bytes"], defaults.max_body_bytes as f64) as usize;
        let pool_size = number_or(&config_obj["thread-pool"]["pool-size"], defaults.pool_size as f64) as usize;

        let log_level = match logging["log-level"].as_str() {
            Some(level) => level.parse().unwrap_or_else(|err| {
                logger::warn!("{}, falling back to {}", err, defaults.log_level);
                defaults.log_level
            }),
            None => defaults.log_level,
        };

        let log_target = match logging["log-target"].as_str() {
            Some("file") => {
                let file_path = logging["file-path"].as_str().unwrap_or("log.txt");
                LogTargetKind::File(PathBuf::from(file_path))
            }
            _ => LogTargetKind::Console,
        };
        let capacity = number_or(&logging["cache-capacity"], defaults.capacity as f64) as usize;

        Ok(Config {
            ip,
            port,
            read_timeout,
            max_body_bytes,
            pool_size: pool_size.max(1),
            log_level,
            log_target,
            capacity: capacity.max(1),
        })
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.ip = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            read_timeout: self.read_timeout,
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn build_log_target(&self) -> Box<dyn LogTarget + Send + Sync> {
        match &self.log_target {
            LogTargetKind::Console => Box::new(ConsoleLogTarget),
            LogTargetKind::File(path) => match FileLogTarget::new(path) {
                Ok(target) => Box::new(target),
                Err(err) => {
                    logger::error!("Could not open log file {}: {}, logging to console", path.display(), err);
                    Box::new(ConsoleLogTarget)
                }
            },
        }
    }
}

// Negative values are treated as absent.
fn number_or(value: &JsonValue, default: f64) -> f64 {
    match value.as_number() {
        Some(number) if number >= 0.0 => number,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = Config::from_json(r#"{
            "server": { "ip-address": "127.0.0.1", "port": 8080, "read-timeout-secs": 5, "max-body-bytes": 1024 },
            "thread-pool": { "pool-size": 4 },
            "logging": { "log-level": "debug", "log-target": "file", "file-path": "decoder.log", "cache-capacity": 16 }
        }"#).unwrap();

        assert_eq!(config, Config {
            ip: "127.0.0.1".to_string(),
            port: 8080,
            read_timeout: Duration::from_secs(5),
            max_body_bytes: 1024,
            pool_size: 4,
            log_level: LogLevel::Debug,
            log_target: LogTargetKind::File(PathBuf::from("decoder.log")),
            capacity: 16,
        });
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::from_json(r#"{ "server": { "port": 9000 } }"#).unwrap();
        assert_eq!(config, Config { port: 9000, ..Config::default() });
        assert_eq!(config.address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_values_use_defaults() {
        let config = Config::from_json(r#"{
            "server": { "port": "eighty", "read-timeout-secs": 0 },
            "thread-pool": { "pool-size": 0 },
            "logging": { "log-level": "loud", "log-target": "syslog", "cache-capacity": -3 }
        }"#).unwrap();
        assert_eq!(config, Config { pool_size: 1, ..Config::default() });
    }

    #[test]
    fn test_malformed_config() {
        assert!(Config::from_json("{ server: ").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("does/not/exist/config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["server", "--config", "other.json", "--host", "127.0.0.1", "--port", "8081"]);
        let mut config = Config::default();
        config.apply_cli(&cli);

        assert_eq!(cli.config, PathBuf::from("other.json"));
        assert_eq!(config.address(), "127.0.0.1:8081");
        assert_eq!(config.session_settings(), SessionSettings::default());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["server"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
    }
}
