use std::path::Path;
use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

/// Backing JSON document holding every collection.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("log.format must be `compact` or `json`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Optional side listener for `/healthz` and `/metrics`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub addr: Option<String>,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_db_path() -> String { "db.json".into() }

/// Load from `CONFIG_PATH`, falling back to `config.toml` or built-in defaults.
pub fn load_default() -> Result<AppConfig> {
    match std::env::var("CONFIG_PATH") {
        Ok(path) => load_from_file(&path),
        Err(_) => load_optional(DEFAULT_CONFIG_PATH),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file '{path}': {e}"))?;
    let cfg: AppConfig = toml::from_str(&content)
        .map_err(|e| anyhow!("failed to parse config file '{path}': {e}"))?;
    Ok(cfg)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_optional(path: &str) -> Result<AppConfig> {
    if Path::new(path).exists() {
        load_from_file(path)
    } else {
        Ok(AppConfig::default())
    }
}

impl AppConfig {
    /// File (explicit or default), then process environment.
    ///
    /// Not validated: callers overlay their own values and then run
    /// [`AppConfig::normalize_and_validate`] once.
    pub fn load_layered(explicit_path: Option<&str>) -> Result<Self> {
        let mut cfg = match explicit_path {
            Some(path) => load_from_file(path)?,
            None => load_default()?,
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Overlay values taken from `lookup` (usually `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow!("SERVER_PORT `{port}` is not a valid port: {e}"))?;
        }
        if let Some(threads) = lookup("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = threads.trim().parse().ok();
        }
        if let Some(path) = lookup("DB_PATH") {
            self.database.path = path;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.log.format = format.parse()?;
        }
        if let Some(addr) = lookup("ADMIN_ADDR") {
            self.admin.addr = Some(addr);
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        if let Some(addr) = &self.admin.addr {
            if addr.trim().is_empty() {
                self.admin.addr = None;
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(anyhow!("database.path is empty; set it in config.toml, DB_PATH or --db"));
        }
        Ok(())
    }
}
