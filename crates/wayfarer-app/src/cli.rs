//! CLI argument definitions for the Wayfarer application.
//!
//! Priority resolution: CLI flag > `WAYFARER_*` env var > config file > default.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Default server port when neither flag, env nor config names one.
pub const DEFAULT_PORT: u16 = 7860;

/// Wayfarer - a conversational travel assistant with emergency alerts.
#[derive(Parser, Debug)]
#[command(name = "wayfarer", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// HTTP/WebSocket server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Data directory for the SQLite database and the local contact file.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API and the chat socket (default).
    Serve,
    /// Chat in the terminal.
    Chat {
        /// User id for contacts and the conversation session.
        #[arg(short = 'u', long = "user", default_value = "terminal_user")]
        user: String,
    },
}

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// --config > WAYFARER_CONFIG > ~/.wayfarer/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(&process_env)
    }

    fn resolve_config_path_with(&self, env: EnvLookup<'_>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env("WAYFARER_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// --port > WAYFARER_PORT > config file value > 7860.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.resolve_port_with(config_port, &process_env)
    }

    fn resolve_port_with(&self, config_port: u16, env: EnvLookup<'_>) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = env("WAYFARER_PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            return p;
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// --data-dir > WAYFARER_DATA_DIR > config file value.
    pub fn resolve_data_dir(&self, config_dir: &str) -> String {
        self.resolve_data_dir_with(config_dir, &process_env)
    }

    fn resolve_data_dir_with(&self, config_dir: &str, env: EnvLookup<'_>) -> String {
        if let Some(ref p) = self.data_dir {
            return p.to_string_lossy().to_string();
        }
        env("WAYFARER_DATA_DIR").unwrap_or_else(|| config_dir.to_string())
    }

    /// --log-level > WAYFARER_LOG_LEVEL > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.resolve_log_level_with(config_level, &process_env)
    }

    fn resolve_log_level_with(&self, config_level: &str, env: EnvLookup<'_>) -> String {
        if let Some(ref l) = self.log_level {
            return l.clone();
        }
        env("WAYFARER_LOG_LEVEL").unwrap_or_else(|| config_level.to_string())
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\"));
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// `file` itself when absolute, else joined onto `data_dir`.
pub fn resolve_in_data_dir(data_dir: &Path, file: &str) -> PathBuf {
    let path = expand_home(file);
    if path.is_absolute() {
        path
    } else {
        data_dir.join(path)
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".wayfarer").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
