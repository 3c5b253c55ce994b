//! Parallel extraction over a set of article directories.

use std::path::{Path, PathBuf};

use corpusbuilder_core::{ArticleDir, ArticleSink};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{Dispatch, debug, error, info};

use crate::assembler::MetadataAssembler;
use crate::error::Result;

/// One document that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleFailure {
    pub pmc_id: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    /// Documents assembled and written.
    pub processed: usize,
    /// Article directories skipped because no license was found for them.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<ArticleFailure>,
}

enum Outcome {
    Written,
    Skipped,
    Failed(ArticleFailure),
}

pub struct ExtractionPipeline {
    assembler: MetadataAssembler,
    pool: rayon::ThreadPool,
}

impl ExtractionPipeline {
    /// `workers == 0` sizes the pool to the available cores. Worker threads
    /// log through the dispatcher current at construction.
    pub fn new(assembler: MetadataAssembler, workers: usize) -> Result<Self> {
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("extract-{i}"))
            .spawn_handler(move |thread| {
                let mut builder = std::thread::Builder::new();
                if let Some(name) = thread.name() {
                    builder = builder.name(name.to_owned());
                }
                if let Some(stack_size) = thread.stack_size() {
                    builder = builder.stack_size(stack_size);
                }
                let dispatch = dispatch.clone();
                builder.spawn(move || tracing::dispatcher::with_default(&dispatch, || thread.run()))?;
                Ok(())
            })
            .build()?;
        Ok(Self { assembler, pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Assemble every document of every article and hand the records to
    /// `sink`. `license_of` returns `None` for articles that must be skipped.
    ///
    /// A failing document is logged once and reported in the summary; no
    /// record is written for it and the run continues.
    pub fn run<L>(&self, articles: &[ArticleDir], license_of: L, sink: &dyn ArticleSink) -> ExtractSummary
    where
        L: Fn(&ArticleDir) -> Option<String> + Sync,
    {
        info!(
            articles = articles.len(),
            workers = self.workers(),
            "extracting articles"
        );

        let outcomes: Vec<Outcome> = self.pool.install(|| {
            articles
                .par_iter()
                .flat_map_iter(|article| match license_of(article) {
                    Some(license) => article
                        .documents
                        .iter()
                        .map(|document| {
                            let name = record_name(article, document);
                            self.process(article, document, &name, &license, sink)
                        })
                        .collect::<Vec<_>>(),
                    None => {
                        debug!(pmc_id = %article.pmc_id, "no eligible license, skipping");
                        vec![Outcome::Skipped]
                    }
                })
                .collect()
        });

        let mut summary = ExtractSummary::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Written => summary.processed += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed(failure) => {
                    summary.failed += 1;
                    summary.failures.push(failure);
                }
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "extraction finished"
        );
        summary
    }

    fn process(
        &self,
        article: &ArticleDir,
        document: &Path,
        name: &str,
        license: &str,
        sink: &dyn ArticleSink,
    ) -> Outcome {
        let result = self
            .assembler
            .assemble(&article.pmc_id, document, license, &article.images)
            .and_then(|record| sink.write(name, &record).map_err(Into::into));

        match result {
            Ok(()) => {
                debug!(pmc_id = %article.pmc_id, path = %document.display(), "article written");
                Outcome::Written
            }
            Err(e) => {
                error!(
                    pmc_id = %article.pmc_id,
                    path = %document.display(),
                    error = %e,
                    "failed to extract article"
                );
                Outcome::Failed(ArticleFailure {
                    pmc_id: article.pmc_id.clone(),
                    path: document.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// The PMC id for single-document articles; the document stem otherwise, so
/// sibling documents never overwrite each other.
fn record_name(article: &ArticleDir, document: &Path) -> String {
    if article.documents.len() <= 1 {
        return article.pmc_id.clone();
    }
    document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| article.pmc_id.clone())
}
