use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root configuration, loaded from `~/.config/corpusbuilder/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub index: IndexConfig,
    pub download: DownloadConfig,
    pub paths: PathsConfig,
    pub extract: ExtractConfig,
}

/// PMC E-utilities search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub tool: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pmcids: Option<u32>,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

/// Column names and license gate for the PMC file list CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub accession_id_header: String,
    pub file_url_header: String,
    pub license_header: String,
    pub accepted_licenses: Vec<String>,
}

/// Where article archives are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Prefix for the index's relative archive paths (`oa_package/..`).
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Keep the `.tar.gz` next to the unpacked folder.
    pub keep_archives: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub download_dir: PathBuf,
    pub extract_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Worker threads for the extraction pool; `0` means one per core.
    pub workers: usize,
    pub document_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub country_match: CountryMatch,
}

/// Which gazetteer entry wins when several country names occur in one string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryMatch {
    /// The last matching entry in gazetteer order.
    #[default]
    Last,
    /// The longest matching entry; gazetteer order breaks ties.
    Longest,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tool: "corpusbuilder".to_string(),
            email: String::new(),
            max_pmcids: Some(100),
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            proxy: None,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            accession_id_header: "Accession ID".to_string(),
            file_url_header: "File".to_string(),
            license_header: "License".to_string(),
            accepted_licenses: vec!["CC BY".to_string(), "CC0".to_string()],
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ftp.ncbi.nlm.nih.gov/pub/pmc/".to_string(),
            proxy: None,
            keep_archives: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("corpusbuilder");

        Self {
            download_dir: data_dir.join("download"),
            extract_dir: data_dir.join("extract"),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            document_extensions: vec!["nxml".to_string()],
            image_extensions: ["gif", "jpeg", "jpg", "png", "tif", "tiff", "bmp", "eps"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            country_match: CountryMatch::Last,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/corpusbuilder/config.toml`
    pub fn config_path() -> PathBuf {
        // Allow override via env var
        if let Ok(path) = std::env::var("CORPUSBUILDER_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("corpusbuilder")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// NCBI asks every E-utilities caller to identify itself with an email.
    pub fn validate_for_search(&self) -> Result<()> {
        if self.search.email.trim().is_empty() {
            return Err(CoreError::Config(
                "search.email is empty; add an email address to the config file".to_string(),
            ));
        }
        if self.search.tool.trim().is_empty() {
            return Err(CoreError::Config("search.tool is empty".to_string()));
        }
        Ok(())
    }
}
