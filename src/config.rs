use anyhow::{bail, Result};
use serde::Deserialize;
use std::{path::Path, sync::Arc};
use tokio::fs;

/// Parse the configuration from a given file
pub async fn parse<P: AsRef<Path>>(path: P) -> Result<SharedConfig> {
    let raw = fs::read(path).await?;
    let data: Config = toml::from_slice(&raw)?;
    data.validate()?;
    Ok(Arc::new(data))
}

/// Load the configuration from the file if one was provided, otherwise use the defaults
pub async fn load<P: AsRef<Path>>(path: Option<P>) -> Result<SharedConfig> {
    match path {
        Some(path) => parse(path).await,
        None => Ok(Arc::new(Config::default())),
    }
}

pub type SharedConfig = Arc<Config>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: Agent,
    pub transfer: Transfer,
    pub probe: Probe,
    pub output: Output,
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.output.batch_size == 0 {
            bail!("output.batch-size must be greater than zero");
        }
        if self.probe.count == 0 {
            bail!("probe.count must be greater than zero");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub log: String,
    pub sentry: Option<String>,
}

impl Default for Agent {
    fn default() -> Agent {
        Agent {
            log: "info".into(),
            sentry: None,
        }
    }
}

/// Settings for the zone transfer connection
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub port: u16,
    /// Seconds to wait on each network operation
    pub timeout: u64,
}

impl Default for Transfer {
    fn default() -> Transfer {
        Transfer {
            port: 53,
            timeout: 30,
        }
    }
}

/// How hosts are checked for liveness
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub command: String,
    /// Echo requests sent per host
    pub count: u32,
    /// Seconds to wait for each reply
    pub timeout: u32,
}

impl Default for Probe {
    fn default() -> Probe {
        Probe {
            command: "ping".into(),
            count: 2,
            timeout: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Output {
    /// Maximum number of entries written to a single file
    pub batch_size: usize,
}

impl Default for Output {
    fn default() -> Output {
        Output { batch_size: 500 }
    }
}
