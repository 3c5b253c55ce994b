//! corpusbuilder core: article records, configuration, document index,
//! article discovery, output sinks, PMC search and archive download.

pub mod config;
pub mod download;
pub mod error;
pub mod eutils;
mod http;
pub mod index;
pub mod models;
pub mod scan;
pub mod storage;

pub use config::{
    AppConfig, CountryMatch, DownloadConfig, ExtractConfig, IndexConfig, PathsConfig, SearchConfig,
};
pub use download::{ArchiveDownloader, DownloadFailure, DownloadSummary};
pub use error::{CoreError, Result};
pub use eutils::EutilsClient;
pub use index::{DocumentIndex, IndexEntry, accession_id};
pub use models::*;
pub use scan::{ArticleDir, scan_articles};
pub use storage::{ArticleSink, JsonDirSink, MemorySink};
