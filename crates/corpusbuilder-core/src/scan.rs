//! Article directory discovery: find unpacked article folders and the
//! documents and images inside them.
//!
//! An article directory is any directory that directly holds a document file
//! (`.nxml` by default). Its basename is the article identifier.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::ExtractConfig;
use crate::error::Result;

/// One unpacked article folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDir {
    pub pmc_id: String,
    pub root: PathBuf,
    /// Tagged documents, sorted.
    pub documents: Vec<PathBuf>,
    /// Image files below `root`, with forward slashes, sorted.
    pub images: Vec<String>,
}

/// Walk `root` and return every article directory below it.
pub fn scan_articles(root: &Path, config: &ExtractConfig) -> Result<Vec<ArticleDir>> {
    let mut article_roots = BTreeSet::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file()
            && has_extension(entry.path(), &config.document_extensions)
            && let Some(parent) = entry.path().parent()
        {
            article_roots.insert(parent.to_path_buf());
        }
    }

    let mut articles = Vec::with_capacity(article_roots.len());
    for dir in article_roots {
        let article = scan_article_dir(&dir, config)?;
        debug!(
            pmc_id = %article.pmc_id,
            documents = article.documents.len(),
            images = article.images.len(),
            "discovered article directory"
        );
        articles.push(article);
    }
    Ok(articles)
}

/// Collect documents and images below a single article directory.
pub fn scan_article_dir(dir: &Path, config: &ExtractConfig) -> Result<ArticleDir> {
    let pmc_id = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut documents = Vec::new();
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if has_extension(path, &config.document_extensions) {
            documents.push(path.to_path_buf());
        } else if has_extension(path, &config.image_extensions) {
            images.push(normalize_slashes(path));
        }
    }

    Ok(ArticleDir {
        pmc_id,
        root: dir.to_path_buf(),
        documents,
        images,
    })
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
}

/// Render a path with `/` separators regardless of platform.
pub fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ─── Tests ─────────────────────────────────────────────────
