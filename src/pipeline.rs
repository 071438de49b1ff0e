use crate::{
    args::Args,
    batch::BatchWriter,
    classifier::{self, Mode},
    config::Config,
    prober::{self, Report, SharedProbe},
    zone,
};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::{io::Write, path::PathBuf, sync::Arc};
use tracing::{error, info, instrument};

/// What a run found and produced
#[derive(Debug, Default)]
pub struct Summary {
    pub suspects: usize,
    pub alive: usize,
    pub dead: usize,
    pub failed: usize,
    pub written: Vec<PathBuf>,
}

/// Transfer the zone, find the suspects, probe them and write the removal scripts
///
/// The human-readable report goes to `out`. A failed zone transfer is logged
/// and treated as an empty zone. Probing is skipped when there are no suspects
/// and nothing is written when every suspect responded.
#[instrument(skip_all, fields(zone = %args.zone, server = %args.dns_server))]
pub async fn run<W>(
    args: &Args,
    config: &Config,
    probe: SharedProbe,
    out: &mut W,
) -> Result<Summary>
where
    W: Write + Send,
{
    let mode = args.mode();
    match mode {
        Mode::Ddns => writeln!(
            out,
            "Finding records in zone {} with both an A and TXT record",
            args.zone
        )?,
        Mode::Plain | Mode::Duplicate => {
            writeln!(out, "Finding A records in zone {}", args.zone)?
        }
    }

    info!("transferring zone");
    let records = match zone::fetch(&args.dns_server, &args.zone, &config.transfer).await {
        Ok(sets) => sets.into_iter().map(Arc::new).collect::<Vec<_>>(),
        Err(e) => {
            let e = anyhow::Error::from(e);
            error!("zone transfer failed: {:#}", e);
            writeln!(out, "Unable to transfer {}: {:#}", args.zone, e)?;
            Vec::new()
        }
    };

    let suspects = classifier::classify(&records, mode);
    let mut summary = Summary {
        suspects: suspects.len(),
        ..Default::default()
    };

    if mode == Mode::Duplicate {
        writeln!(out, "The IPs with multiple records are:")?;
        for duplicate in classifier::duplicates(&suspects) {
            writeln!(
                out,
                "IP {} has multiple records: {}",
                duplicate.address,
                duplicate
                    .owners
                    .iter()
                    .map(|owner| owner.fqdn(&args.zone))
                    .join(", ")
            )?;
        }
        return Ok(summary);
    }

    if args.verbose {
        match mode {
            Mode::Ddns => writeln!(
                out,
                "The {} suspected records with both A and TXT records are:",
                suspects.len()
            )?,
            _ => writeln!(
                out,
                "The {} suspected records with an A record are:",
                suspects.len()
            )?,
        }
        for suspect in &suspects {
            writeln!(out, "{}", suspect.name())?;
        }
    }
    writeln!(out, "{} suspected records", suspects.len())?;

    if args.noop {
        return Ok(summary);
    }

    let report = if suspects.is_empty() {
        Report::default()
    } else {
        prober::probe_all(probe, &args.zone, suspects, args.workers)
            .await
            .context("failed to probe suspects")?
    };
    summary.alive = report.alive.len();
    summary.dead = report.dead.len();
    summary.failed = report.failed.len();

    if args.verbose {
        writeln!(out, "{} records replied to ping", report.alive.len())?;
        writeln!(
            out,
            "The {} records that don't reply to ping are:",
            report.dead.len()
        )?;
        for dead in &report.dead {
            writeln!(out, "{}", dead.name())?;
        }
    }
    writeln!(out, "{} dead records found", report.dead.len())?;

    if !report.failed.is_empty() {
        writeln!(
            out,
            "{} records could not be checked and will not be removed",
            report.failed.len()
        )?;
        if args.verbose {
            for (suspect, e) in &report.failed {
                writeln!(out, "{}: {}", suspect.name(), e)?;
            }
        }
    }

    if report.dead.is_empty() {
        return Ok(summary);
    }

    let base = args.output();
    let writer = BatchWriter::new(&base, &args.zone, config.output.batch_size);
    summary.written = writer
        .write(&report.dead)
        .await
        .with_context(|| format!("failed to write update scripts to {}", base.display()))?;

    writeln!(
        out,
        "Wrote file to {0} - check the output and run nsupdate on {0}.*",
        base.display()
    )?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::{
        args::Args,
        config::{Config, Transfer},
        prober::{Error, Probe, SharedProbe},
        zone::testing::{a, serve, soa, txt},
    };
    use async_trait::async_trait;
    use hickory_proto::op::ResponseCode;
    use std::{
        collections::HashSet,
        fs,
        net::SocketAddr,
        path::Path,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    /// Reports the listed hosts as down and fails to check the broken ones
    #[derive(Default)]
    struct Down {
        hosts: HashSet<String>,
        broken: HashSet<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Probe for Down {
        async fn probe(&self, host: &str) -> crate::prober::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(host) {
                return Err(Error::Terminated {
                    command: "ping".into(),
                });
            }
            Ok(!self.hosts.contains(host))
        }
    }

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    fn args(output: &Path) -> Args {
        Args {
            zone: "example.com".into(),
            dns_server: "127.0.0.1".into(),
            filename: Some(output.to_owned()),
            verbose: true,
            ddns: false,
            noop: false,
            dup: false,
            workers: 2,
            config: None,
            log_level: None,
        }
    }

    fn config(address: SocketAddr) -> Config {
        Config {
            transfer: Transfer {
                port: address.port(),
                timeout: 5,
            },
            ..Default::default()
        }
    }

    async fn zone() -> SocketAddr {
        serve(
            vec![vec![
                soa("example.com."),
                a("a.example.com.", 1),
                txt("a.example.com.", "31abc"),
                a("b.example.com.", 2),
                a("c.example.com.", 3),
                txt("c.example.com.", "31def"),
                soa("example.com."),
            ]],
            ResponseCode::NoError,
        )
        .await
    }

    fn down(hosts: &[&str]) -> Arc<Down> {
        Arc::new(Down {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn writes_dead_ddns_records() {
        let dir = tempfile::tempdir().unwrap();
        let address = zone().await;
        let mut args = args(&dir.path().join("out"));
        args.ddns = true;

        let probe = down(&["a.example.com", "b.example.com"]);
        let mut out = Vec::new();
        let summary = run(&args, &config(address), probe.clone(), &mut out)
            .await
            .expect("run failed");

        assert_eq!(summary.suspects, 2);
        assert_eq!(summary.dead, 1);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.written, vec![dir.path().join("out.0")]);
        assert_eq!(
            fs::read_to_string(&summary.written[0]).unwrap(),
            "update delete a.example.com 300 A 10.0.0.1\n\
             update delete a.example.com 300 TXT \"31abc\"\n\
             send\n"
        );

        let base = dir.path().join("out");
        assert_eq!(
            printed(out),
            format!(
                "Finding records in zone example.com with both an A and TXT record\n\
                 The 2 suspected records with both A and TXT records are:\n\
                 a\n\
                 c\n\
                 2 suspected records\n\
                 1 records replied to ping\n\
                 The 1 records that don't reply to ping are:\n\
                 a\n\
                 1 dead records found\n\
                 Wrote file to {0} - check the output and run nsupdate on {0}.*\n",
                base.display()
            )
        );
    }

    #[tokio::test]
    async fn nothing_dead() {
        let dir = tempfile::tempdir().unwrap();
        let address = zone().await;

        let summary = run(
            &args(&dir.path().join("out")),
            &config(address),
            down(&[]),
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.suspects, 3);
        assert_eq!(summary.alive, 3);
        assert_eq!(summary.dead, 0);
        assert!(summary.written.is_empty());
        assert!(!dir.path().join("out.0").exists());
    }

    #[tokio::test]
    async fn noop_skips_probing() {
        let dir = tempfile::tempdir().unwrap();
        let address = zone().await;
        let mut args = args(&dir.path().join("out"));
        args.noop = true;

        let probe = down(&["a.example.com"]);
        let mut out = Vec::new();
        let summary = run(&args, &config(address), probe.clone(), &mut out)
            .await
            .unwrap();

        assert_eq!(summary.suspects, 3);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(summary.written.is_empty());
        assert!(printed(out).ends_with("3 suspected records\n"));
    }

    #[tokio::test]
    async fn duplicate_report_skips_probing() {
        let dir = tempfile::tempdir().unwrap();
        let address = serve(
            vec![vec![
                soa("example.com."),
                a("x.example.com.", 4),
                a("y.example.com.", 4),
                a("z.example.com.", 5),
                soa("example.com."),
            ]],
            ResponseCode::NoError,
        )
        .await;
        let mut args = args(&dir.path().join("out"));
        args.dup = true;

        let probe = down(&["x.example.com"]);
        let mut out = Vec::new();
        let summary = run(&args, &config(address), probe.clone(), &mut out)
            .await
            .unwrap();

        assert_eq!(summary.suspects, 2);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(summary.written.is_empty());
        assert_eq!(
            printed(out),
            "Finding A records in zone example.com\n\
             The IPs with multiple records are:\n\
             IP 10.0.0.4 has multiple records: x.example.com, y.example.com\n"
        );
    }

    #[tokio::test]
    async fn failed_transfer_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let address = serve(vec![vec![]], ResponseCode::Refused).await;

        let probe = down(&[]);
        let mut out = Vec::new();
        let summary = run(
            &args(&dir.path().join("out")),
            &config(address),
            probe.clone(),
            &mut out,
        )
        .await
        .expect("a failed transfer should not be fatal");

        assert_eq!(summary.suspects, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(summary.written.is_empty());

        let out = printed(out);
        assert!(out.contains("Unable to transfer example.com"));
        assert!(out.contains("0 suspected records\n"));
    }

    #[tokio::test]
    async fn unprobeable_hosts_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let address = zone().await;

        let probe = Arc::new(Down {
            broken: ["c.example.com".to_owned()].into_iter().collect(),
            ..Default::default()
        });
        let mut out = Vec::new();
        let summary = run(
            &args(&dir.path().join("out")),
            &config(address),
            probe,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.dead, 0);
        assert!(summary.written.is_empty());

        let out = printed(out);
        assert!(out.contains("0 dead records found\n"));
        assert!(out.contains("1 records could not be checked and will not be removed\n"));
        assert!(out.contains("c: \"ping\" was terminated by a signal\n"));
        assert!(!out.contains("Wrote file"));
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let address = zone().await;

        let probe: SharedProbe = down(&["b.example.com"]);
        let mut out = Vec::new();
        let result = run(
            &args(&dir.path().join("missing/out")),
            &config(address),
            probe,
            &mut out,
        )
        .await;

        assert!(result.is_err());
        let out = printed(out);
        assert!(out.contains("The 1 records that don't reply to ping are:\nb\n"));
        assert!(out.contains("1 dead records found\n"));
        assert!(!out.contains("run nsupdate"));
    }
}
