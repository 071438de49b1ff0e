use crate::{classifier::Suspect, zone::RecordSet};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
};
use tracing::{debug, info, instrument, warn};

mod error;

pub use error::Error;
use error::Result;

/// The line that tells nsupdate to commit the pending updates
const COMMIT: &[u8] = b"send\n";

/// Writes the removal candidates as nsupdate scripts
///
/// Every script holds at most `batch_size` entries and is named `<base>.<n>`,
/// counting up from zero.
#[derive(Debug)]
pub struct BatchWriter {
    base: PathBuf,
    origin: String,
    batch_size: usize,
}

impl BatchWriter {
    pub fn new<P, S>(base: P, origin: S, batch_size: usize) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        Self {
            base: base.into(),
            origin: origin.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// The path of the n-th script
    pub fn path(&self, index: usize) -> PathBuf {
        let mut path = self.base.clone().into_os_string();
        path.push(format!(".{}", index));
        path.into()
    }

    /// Write every entry, returning the scripts that were created
    ///
    /// Nothing is written when there are no entries. Scripts completed before an
    /// error are left in place.
    #[instrument(skip(self, entries), fields(base = %self.base.display(), count = entries.len()))]
    pub async fn write(&self, entries: &[Suspect]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (index, batch) in entries.chunks(self.batch_size).enumerate() {
            let path = self.path(index);
            self.write_batch(&path, batch).await?;

            debug!(path = %path.display(), entries = batch.len(), "wrote batch");
            written.push(path);
        }

        info!(files = written.len(), "finished writing update scripts");
        Ok(written)
    }

    async fn write_batch(&self, path: &Path, batch: &[Suspect]) -> Result<()> {
        let file = File::create(path).await.map_err(|source| Error::Create {
            path: path.to_owned(),
            source,
        })?;

        let mut out = BufWriter::new(file);
        write_script(&mut out, &self.origin, batch)
            .await
            .map_err(|source| Error::Write {
                path: path.to_owned(),
                source,
            })
    }
}

/// Write the update lines followed by the commit line
///
/// The commit line is still attempted when writing the updates fails, so a
/// partial script is terminated the same way as a complete one.
async fn write_script<W>(out: &mut W, origin: &str, batch: &[Suspect]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = write_updates(out, origin, batch).await;
    if let Err(e) = &body {
        warn!(error = %e, "failed writing updates, terminating script early");
    }

    let commit = finish(out).await;
    body.and(commit)
}

async fn write_updates<W>(out: &mut W, origin: &str, batch: &[Suspect]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for suspect in batch {
        for line in render(origin, &suspect.records) {
            out.write_all(line.as_bytes()).await?;
        }
    }

    Ok(())
}

async fn finish<W>(out: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(COMMIT).await?;
    out.flush().await
}

/// Render a delete instruction for every record in the set
pub fn render(origin: &str, records: &RecordSet) -> Vec<String> {
    let fqdn = records.fqdn(origin);

    records
        .groups()
        .iter()
        .flat_map(|group| {
            let fqdn = &fqdn;
            group.records.iter().map(move |record| {
                format!(
                    "update delete {} {} {} {}\n",
                    fqdn, record.ttl, group.kind, record.value
                )
            })
        })
        .collect()
}
