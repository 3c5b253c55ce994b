use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use corpusbuilder_core::{
    AppConfig, ArchiveDownloader, ArticleDir, DocumentIndex, EutilsClient, JsonDirSink, accession_id,
    scan_articles,
};
use corpusbuilder_extract::{AffiliationResolver, Document, ExtractionPipeline, MetadataAssembler};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "corpusbuilder",
    about = "Build a table and figure corpus from PubMed Central articles",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format.
    /// Also enabled by setting CORPUSBUILDER_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PMC and list the matching PMCIDs.
    Search {
        /// URL-encoded query, e.g. `(covid)+AND+(gel%20electrophoresis)`.
        #[arg(long)]
        terms: String,
        /// Write ids to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Download and unpack the archives of openly licensed articles.
    Download {
        /// PMC file list CSV (oa_file_list.csv).
        #[arg(long)]
        index: PathBuf,
        /// Search PMC for these terms and download the hits.
        #[arg(long, conflicts_with = "ids", required_unless_present = "ids")]
        terms: Option<String>,
        /// File with one PMCID per line, e.g. the output of `search`.
        #[arg(long)]
        ids: Option<PathBuf>,
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },

    /// Extract JSON metadata from downloaded article directories.
    Extract {
        /// PMC file list CSV (oa_file_list.csv).
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        download_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Worker threads; 0 means one per core.
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Resolve a single `<aff>` snippet and print the record.
    Affiliation { markup: String },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write a default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("CORPUSBUILDER_JSON").as_deref() == Ok("1");
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    match cli.command {
        // ── Search ─────────────────────────────────────────────────────────

        Commands::Search { terms, output } => {
            config.validate_for_search()?;
            let client = EutilsClient::new(&config.search)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let ids = runtime.block_on(client.search(&terms, &config.search))?;
            info!(count = ids.len(), "retrieved PMCIDs");
            let dur = start.elapsed().as_millis();

            if let Some(path) = &output {
                write_lines(path, &ids)?;
            }
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "ids": ids, "total": ids.len(), "terms": terms },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if output.is_none() {
                for id in &ids {
                    println!("{id}");
                }
            } else {
                println!("Wrote {} PMCIDs.", ids.len());
            }
        }

        // ── Download ───────────────────────────────────────────────────────

        Commands::Download {
            index,
            terms,
            ids,
            download_dir,
        } => {
            let download_dir = download_dir.unwrap_or_else(|| config.paths.download_dir.clone());
            let document_index = DocumentIndex::load(&index, &config.index)
                .with_context(|| format!("loading index {}", index.display()))?;
            info!(entries = document_index.len(), "index loaded");

            let runtime = tokio::runtime::Runtime::new()?;
            let pmc_ids = match (&terms, &ids) {
                (Some(terms), _) => {
                    config.validate_for_search()?;
                    let client = EutilsClient::new(&config.search)?;
                    runtime.block_on(client.search(terms, &config.search))?
                }
                (None, Some(path)) => read_lines(path)?,
                (None, None) => bail!("pass --terms or --ids"),
            };
            info!(count = pmc_ids.len(), "retrieving documents");

            let downloader = ArchiveDownloader::new(&config.download)?;
            let summary = runtime.block_on(downloader.download_all(&pmc_ids, &document_index, &download_dir));
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":summary,"meta":{"duration_ms":dur}}))?;
            } else {
                println!(
                    "Downloaded {} articles into {} ({} skipped, {} failed).",
                    summary.downloaded.len(),
                    download_dir.display(),
                    summary.skipped.len(),
                    summary.failures.len()
                );
                for failure in &summary.failures {
                    println!("  {}: {}", failure.pmc_id, failure.reason);
                }
            }
        }

        // ── Extract ────────────────────────────────────────────────────────

        Commands::Extract {
            index,
            download_dir,
            output_dir,
            workers,
        } => {
            let download_dir = download_dir.unwrap_or_else(|| config.paths.download_dir.clone());
            let output_dir = output_dir.unwrap_or_else(|| config.paths.extract_dir.clone());
            let workers = workers.unwrap_or(config.extract.workers);

            let document_index = DocumentIndex::load(&index, &config.index)
                .with_context(|| format!("loading index {}", index.display()))?;
            info!(entries = document_index.len(), "index loaded");

            let articles = scan_articles(&download_dir, &config.extract)?;
            let assembler = MetadataAssembler::new(AffiliationResolver::from_config(&config.extract));
            let pipeline = ExtractionPipeline::new(assembler, workers)?;
            let sink = JsonDirSink::new(&output_dir);

            let license_of = |article: &ArticleDir| {
                let entry = document_index.get_metadata(&accession_id(&article.pmc_id));
                if entry.found {
                    entry.license
                } else {
                    debug!(pmc_id = %article.pmc_id, "license not accepted or not indexed");
                    None
                }
            };
            let summary = pipeline.run(&articles, license_of, &sink);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":summary,"meta":{"duration_ms":dur}}))?;
            } else {
                println!(
                    "Extracted {} documents into {} ({} skipped, {} failed).",
                    summary.processed,
                    output_dir.display(),
                    summary.skipped,
                    summary.failed
                );
                for failure in &summary.failures {
                    println!("  {}: {}", failure.pmc_id, failure.reason);
                }
            }
        }

        // ── Affiliation ────────────────────────────────────────────────────

        Commands::Affiliation { markup } => {
            let doc = Document::parse(&markup)?;
            let Some(aff) = doc.find("aff") else {
                bail!("no <aff> element in input");
            };
            let record = AffiliationResolver::from_config(&config.extract).resolve(aff);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":record,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":config_path,"exists":config_path.exists()}}))?;
                } else {
                    println!("{}", config_path.display());
                }
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    bail!(
                        "{} already exists; pass --force to overwrite",
                        config_path.display()
                    );
                }
                AppConfig::default().save_to(&config_path)?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":config_path}}))?;
                } else {
                    println!("Wrote default config to {}", config_path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Non-blank trimmed lines of a text file.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let body =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
