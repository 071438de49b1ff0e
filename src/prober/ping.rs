use super::{
    error::{Error, Result},
    Probe,
};
use crate::config::Probe as ProbeConfig;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

/// Checks hosts using the system's ping utility
#[derive(Debug)]
pub struct Ping {
    command: String,
    count: u32,
    timeout: u32,
}

impl Ping {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            command: config.command.clone(),
            count: config.count,
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Probe for Ping {
    #[instrument(name = "ping", skip(self))]
    async fn probe(&self, host: &str) -> Result<bool> {
        debug!(
            "running `{} -c{} -W{} {}`",
            self.command, self.count, self.timeout, host
        );

        let output = Command::new(&self.command)
            .arg("-c")
            .arg(self.count.to_string())
            .arg("-W")
            .arg(self.timeout.to_string())
            .arg(host)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::Launch {
                command: self.command.clone(),
                source,
            })?;
        trace!(stdout = %String::from_utf8_lossy(&output.stdout), "ping output");

        match output.status.code() {
            Some(code) => Ok(code == 0),
            None => Err(Error::Terminated {
                command: self.command.clone(),
            }),
        }
    }
}
