use std::path::PathBuf;

use thiserror::Error;

/// Article-level failures. Missing or malformed fields never surface here;
/// they degrade to empty values inside the extractors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed markup: {0}")]
    Xml(String),

    #[error("document has no elements: {0}")]
    EmptyDocument(PathBuf),

    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Core(#[from] corpusbuilder_core::CoreError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
