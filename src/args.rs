use crate::classifier::Mode;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dns-sweeper",
    about = "Find stale dynamic DNS records that no longer respond to ping"
)]
pub struct Args {
    /// The zone to purge stale records from
    pub zone: String,

    /// The DNS server to transfer the zone from
    pub dns_server: String,

    /// Where the update scripts are written
    ///
    /// Scripts are suffixed with a batch number, starting at `.0`. Defaults
    /// to /tmp/<zone>.ns
    #[structopt(short, long)]
    pub filename: Option<PathBuf>,

    /// List every suspect and dead record
    #[structopt(short, long)]
    pub verbose: bool,

    /// Only consider owners with exactly an A and a TXT record
    ///
    /// This combination usually indicates the records were created by dynamic DNS.
    #[structopt(short, long, conflicts_with = "dup")]
    pub ddns: bool,

    /// Only display the suspects, don't ping them or write any scripts
    #[structopt(short, long)]
    pub noop: bool,

    /// Display addresses which have A records on multiple owners
    #[structopt(short = "x", long)]
    pub dup: bool,

    /// The number of concurrent ping workers
    #[structopt(short, long, default_value = "4", parse(try_from_str = parse_workers))]
    pub workers: usize,

    /// The configuration file location
    ///
    /// Where the configuration file should be loaded from. The environment
    /// variable DNS_SWEEPER_CONFIG can also be used. Built-in defaults are
    /// used when neither is set.
    #[structopt(short, long, env = "DNS_SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// The minimum level to log at
    ///
    /// The minimum log level specification, supports the rust log format. The
    /// environment variable RUST_LOG can also be used.
    #[structopt(short, long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    /// How suspects should be selected
    pub fn mode(&self) -> Mode {
        if self.ddns {
            Mode::Ddns
        } else if self.dup {
            Mode::Duplicate
        } else {
            Mode::Plain
        }
    }

    /// The base path for the update scripts
    pub fn output(&self) -> PathBuf {
        self.filename
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/tmp/{}.ns", self.zone)))
    }
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("at least one worker is required".into()),
        Ok(count) => Ok(count),
        Err(e) => Err(e.to_string()),
    }
}
