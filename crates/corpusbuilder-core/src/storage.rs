use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::models::ArticleMetadata;

/// Destination for finished article records. `name` identifies the record
/// within its article: the PMC id itself, or the document stem when one
/// article directory holds several documents.
pub trait ArticleSink: Send + Sync {
    fn write(&self, name: &str, article: &ArticleMetadata) -> Result<()>;
}

/// Writes each record as `{root}/{pmc_id}/{name}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    root: PathBuf,
}

impl JsonDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, pmc_id: &str, name: &str) -> PathBuf {
        self.root.join(pmc_id).join(format!("{name}.json"))
    }
}

impl ArticleSink for JsonDirSink {
    fn write(&self, name: &str, article: &ArticleMetadata) -> Result<()> {
        save_article(&self.root, name, article).map(|_| ())
    }
}

/// Collects records in memory; useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, ArticleMetadata)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records with their names, in write order.
    pub fn into_records(self) -> Vec<(String, ArticleMetadata)> {
        self.records.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    pub fn into_articles(self) -> Vec<ArticleMetadata> {
        self.into_records().into_iter().map(|(_, article)| article).collect()
    }
}

impl ArticleSink for MemorySink {
    fn write(&self, name: &str, article: &ArticleMetadata) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((name.to_string(), article.clone()));
        Ok(())
    }
}

/// Save an article record under `{root}/{pmc_id}/{name}.json`.
pub fn save_article(root: &Path, name: &str, article: &ArticleMetadata) -> Result<PathBuf> {
    let dir = root.join(&article.pmc_id);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(article)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Load a previously written article record.
pub fn load_article(path: &Path) -> Result<ArticleMetadata> {
    let contents = fs::read_to_string(path)?;
    let article: ArticleMetadata = serde_json::from_str(&contents)?;
    Ok(article)
}
