use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_top_n() -> usize {
    crate::aggregate::DEFAULT_TOP_N
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
path = "dados_vendas.csv"

[server]
addr = "0.0.0.0:3000"

[dashboard]
top_n = 10
"#;

pub const DATA_ENV: &str = "SALES_DATA";
pub const ADDR_ENV: &str = "SALES_ADDR";

impl Config {
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents).context("invalid configuration")?;
        if config.dashboard.top_n == 0 {
            anyhow::bail!("dashboard.top_n must be at least 1");
        }
        Ok(config)
    }

    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Apply `SALES_DATA` / `SALES_ADDR` style overrides
    pub fn with_overrides(mut self, data_path: Option<String>, addr: Option<String>) -> Self {
        if let Some(path) = data_path {
            self.data.path = path;
        }
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        self
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data.path)
    }
}

/// Load configuration
///
/// Search order:
/// 1. Explicit `--config` path
/// 2. config.toml next to the executable
/// 3. Embedded default config
///
/// Environment overrides are applied last.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(path) => read_config(path)?,
        None => match exe_config_path().filter(|p| p.exists()) {
            Some(path) => read_config(&path)?,
            None => {
                tracing::info!("using default embedded configuration");
                Config::embedded()?
            }
        },
    };

    Ok(config.with_overrides(
        std::env::var(DATA_ENV).ok(),
        std::env::var(ADDR_ENV).ok(),
    ))
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("loading config from: {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    Config::from_toml(&contents)
}

fn exe_config_path() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    Some(exe_path.parent()?.join("config.toml"))
}
