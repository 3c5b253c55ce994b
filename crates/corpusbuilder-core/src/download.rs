//! Article archive retrieval: fetch the `.tar.gz` package the document index
//! points at, unpack it into the download directory and drop the archive.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::DownloadConfig;
use crate::error::{CoreError, Result};
use crate::http::build_client;
use crate::index::{DocumentIndex, IndexEntry, accession_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadFailure {
    pub pmc_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    /// Accession ids fetched and unpacked.
    pub downloaded: Vec<String>,
    /// Ids missing from the index or carrying a non-accepted license.
    pub skipped: Vec<String>,
    pub failures: Vec<DownloadFailure>,
}

pub struct ArchiveDownloader {
    client: reqwest::Client,
    base_url: String,
    keep_archives: bool,
}

impl ArchiveDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        Ok(Self {
            client: build_client("corpusbuilder", config.proxy.as_deref())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            keep_archives: config.keep_archives,
        })
    }

    /// `{base_url}/{ftp_file_path}{file_name}` for an accepted index entry.
    pub fn archive_url(&self, entry: &IndexEntry) -> Option<String> {
        if !entry.found {
            return None;
        }
        let dir = entry.ftp_file_path.as_deref()?.trim_start_matches('/');
        let file_name = entry.file_name.as_deref().filter(|f| !f.is_empty())?;
        Some(format!("{}/{dir}{file_name}", self.base_url))
    }

    /// Download one archive into `download_dir`, unpack it there and remove
    /// the archive unless configured to keep it. Returns the archive path.
    pub async fn download(&self, entry: &IndexEntry, download_dir: &Path) -> Result<PathBuf> {
        let (Some(url), Some(file_name)) = (self.archive_url(entry), entry.file_name.as_deref())
        else {
            return Err(CoreError::NotEligible(entry.pmc_id.clone()));
        };

        debug!(%url, pmc_id = %entry.pmc_id, "fetching article archive");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(CoreError::ApiError(url, format!("HTTP {status}")));
        }
        let bytes = resp.bytes().await?;

        fs::create_dir_all(download_dir)?;
        let archive = download_dir.join(file_name);
        fs::write(&archive, &bytes)?;

        let unpacked = unpack_archive(&archive, download_dir);
        if !self.keep_archives {
            fs::remove_file(&archive)?;
        }
        unpacked?;
        Ok(archive)
    }

    /// Look every id up in `index` and download the accepted ones in order.
    /// A failing id is logged and recorded; the rest still run.
    pub async fn download_all(
        &self,
        pmc_ids: &[String],
        index: &DocumentIndex,
        download_dir: &Path,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary::default();
        for pmc_id in pmc_ids {
            let entry = index.get_metadata(&accession_id(pmc_id));
            if !entry.found {
                debug!(pmc_id = %entry.pmc_id, "not indexed under an accepted license, skipping");
                summary.skipped.push(entry.pmc_id);
                continue;
            }
            match self.download(&entry, download_dir).await {
                Ok(_) => summary.downloaded.push(entry.pmc_id),
                Err(e) => {
                    error!(pmc_id = %entry.pmc_id, error = %e, "failed to download article");
                    summary.failures.push(DownloadFailure {
                        pmc_id: entry.pmc_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            downloaded = summary.downloaded.len(),
            skipped = summary.skipped.len(),
            failed = summary.failures.len(),
            "retrieved documents"
        );
        summary
    }
}

/// Unpack a gzipped tarball into `dest`. Entries that would land outside
/// `dest` are not written.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive)?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball.unpack(dest)?;
    Ok(())
}
