//! Document index: the PMC file list mapping accession ids to archive
//! locations and licenses.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::error::{CoreError, Result};

/// Rows shorter than this are malformed and skipped.
const MIN_ROW_FIELDS: usize = 5;

/// Result of looking up one accession id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// `true` only when the id is indexed under an accepted license.
    pub found: bool,
    pub pmc_id: String,
    pub ftp_file_path: Option<String>,
    pub file_name: Option<String>,
    pub license: Option<String>,
}

#[derive(Debug, Clone)]
struct IndexRow {
    file_url: String,
    license: String,
}

/// In-memory view of the index CSV, keyed by accession id.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    rows: HashMap<String, IndexRow>,
    accepted_licenses: Vec<String>,
}

impl DocumentIndex {
    /// Load the index from a CSV file.
    pub fn load(path: &Path, config: &IndexConfig) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let index = Self::from_reader(file, config)?;
        info!(path = %path.display(), entries = index.len(), "loaded document index");
        Ok(index)
    }

    /// Build the index from any CSV source. The header row names the columns.
    pub fn from_reader<R: Read>(reader: R, config: &IndexConfig) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| CoreError::MissingColumn(name.to_string()))
        };
        let accession_col = column(&config.accession_id_header)?;
        let file_col = column(&config.file_url_header)?;
        let license_col = column(&config.license_header)?;

        let mut rows = HashMap::new();
        let mut skipped = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            if record.len() < MIN_ROW_FIELDS {
                skipped += 1;
                continue;
            }
            let (Some(accession), Some(file_url), Some(license)) = (
                record.get(accession_col),
                record.get(file_col),
                record.get(license_col),
            ) else {
                skipped += 1;
                continue;
            };

            // First row for an accession id wins.
            rows.entry(accession.to_string()).or_insert_with(|| IndexRow {
                file_url: file_url.to_string(),
                license: license.to_string(),
            });
        }

        if skipped > 0 {
            debug!(skipped, "skipped short index rows");
        }

        Ok(Self {
            rows,
            accepted_licenses: config.accepted_licenses.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up an accession id (e.g. `PMC8175420`) and apply the license gate.
    pub fn get_metadata(&self, accession_id: &str) -> IndexEntry {
        match self.rows.get(accession_id) {
            Some(row) if self.accepts(&row.license) => {
                let (ftp_file_path, file_name) = split_file_url(&row.file_url);
                IndexEntry {
                    found: true,
                    pmc_id: accession_id.to_string(),
                    ftp_file_path: Some(ftp_file_path.to_string()),
                    file_name: Some(file_name.to_string()),
                    license: Some(row.license.clone()),
                }
            }
            _ => IndexEntry {
                pmc_id: accession_id.to_string(),
                ..Default::default()
            },
        }
    }

    /// Raw license of an indexed article, accepted or not.
    pub fn license_of(&self, accession_id: &str) -> Option<&str> {
        self.rows.get(accession_id).map(|row| row.license.as_str())
    }

    fn accepts(&self, license: &str) -> bool {
        self.accepted_licenses.iter().any(|l| l == license)
    }
}

/// Index rows are keyed `PMC<digits>`; search results and some article
/// directories drop the prefix.
pub fn accession_id(pmc_id: &str) -> String {
    let pmc_id = pmc_id.trim();
    if pmc_id.starts_with("PMC") {
        pmc_id.to_string()
    } else {
        format!("PMC{pmc_id}")
    }
}

/// Split `oa_package/08/e0/PMC13900.tar.gz` into directory (with trailing
/// slash) and file name.
fn split_file_url(file_url: &str) -> (&str, &str) {
    match file_url.rfind('/') {
        Some(pos) => file_url.split_at(pos + 1),
        None => ("", file_url),
    }
}
