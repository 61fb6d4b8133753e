//! Tickertape CLI: ingest, enrich, run, status and compact commands.
//!
//! Commands:
//! - `ingest`: tag new documents from each source into the sentence store
//! - `enrich`: attach ticker and market signals to pending records
//! - `run`: ingest then enrich, as one resumable pass
//! - `tag`: tag a single document and print the records, without storing
//! - `status`: record counts and source cursors
//! - `compact`: rewrite the store log as one line per live event

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tickertape_core::data::{JsonlDocumentSource, TickerUniverse};
use tickertape_core::domain::{NewsSource, RawDocument};
use tickertape_core::store::{JsonlStore, SentenceStore, SourceCursor, StoreStats};
use tickertape_core::text::RuleAnnotator;
use tickertape_runner::{
    run_enrich, run_ingest, run_pipeline, DocumentTagger, PipelineConfig, PipelineContext,
    ProviderConfig,
};

#[derive(Parser)]
#[command(
    name = "tickertape",
    about = "Tickertape: ticker tagging and signal enrichment for financial news"
)]
struct Cli {
    /// Pipeline config file. Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "tickertape.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag new documents and commit them to the sentence store.
    Ingest {
        /// Sources to ingest (Zacks, SeekingAlpha). Defaults to the config.
        #[arg(long = "source")]
        sources: Vec<NewsSource>,
    },
    /// Attach ticker and market signals to pending records.
    Enrich {
        #[command(flatten)]
        overrides: EnrichArgs,
    },
    /// Ingest every source, then enrich.
    Run {
        #[command(flatten)]
        overrides: EnrichArgs,
    },
    /// Tag one document and print its records without storing them.
    Tag {
        /// Source whose encoding the content uses.
        #[arg(long, default_value = "Zacks")]
        source: NewsSource,

        /// Document date in the source's format.
        #[arg(long)]
        date: String,

        /// File holding the document content.
        file: PathBuf,
    },
    /// Report record counts and source cursors.
    Status,
    /// Rewrite the store log without superseded lines.
    Compact,
}

#[derive(Args)]
struct EnrichArgs {
    /// Worker threads for ticker enrichment.
    #[arg(long)]
    workers: Option<usize>,

    /// End of the price window (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Price window length in calendar days.
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Volatility index symbol for market enrichment.
    #[arg(long)]
    index_symbol: Option<String>,

    /// Use the deterministic synthetic provider instead of the configured one.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

impl EnrichArgs {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(workers) = self.workers {
            config.enrichment.workers = workers;
        }
        if let Some(as_of) = self.as_of {
            config.enrichment.as_of = Some(as_of);
        }
        if let Some(days) = self.lookback_days {
            config.enrichment.lookback_days = days;
        }
        if let Some(symbol) = self.index_symbol {
            config.enrichment.index_symbol = symbol;
        }
        if self.synthetic {
            config.provider = ProviderConfig::Synthetic { seed: 42 };
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { sources } => {
            if !sources.is_empty() {
                config.sources = sources;
            }
            config.validate()?;
            run_ingest_cmd(&config)
        }
        Commands::Enrich { overrides } => {
            overrides.apply(&mut config);
            config.validate()?;
            run_enrich_cmd(&config)
        }
        Commands::Run { overrides } => {
            overrides.apply(&mut config);
            config.validate()?;
            run_pipeline_cmd(&config)
        }
        Commands::Tag { source, date, file } => run_tag(&config, source, date, &file),
        Commands::Status => run_status(&config),
        Commands::Compact => run_compact(&config),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tickertape=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    if path.exists() {
        return PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    info!(path = %path.display(), "config file not found; using defaults");
    Ok(PipelineConfig::default())
}

/// Owned collaborators behind a `PipelineContext`.
struct Resources {
    universe: TickerUniverse,
    documents: JsonlDocumentSource,
    annotator: RuleAnnotator,
    store: JsonlStore,
    provider: Box<dyn tickertape_core::data::DataProvider>,
}

impl Resources {
    fn open(config: &PipelineConfig) -> Result<Self> {
        let universe = TickerUniverse::from_file(&config.universe_path)
            .with_context(|| format!("loading universe {}", config.universe_path.display()))?;
        let store = JsonlStore::open(&config.store_path)
            .with_context(|| format!("opening store {}", config.store_path.display()))?;
        let provider = config.provider.build().context("building market data provider")?;
        Ok(Self {
            universe,
            documents: JsonlDocumentSource::new(&config.documents_dir),
            annotator: RuleAnnotator::with_max_chars(config.max_document_chars),
            store,
            provider,
        })
    }

    fn context<'a>(&'a self, config: &'a PipelineConfig) -> PipelineContext<'a> {
        PipelineContext {
            config,
            universe: &self.universe,
            documents: &self.documents,
            annotator: &self.annotator,
            store: &self.store,
            provider: self.provider.as_ref(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_ingest_cmd(config: &PipelineConfig) -> Result<()> {
    let resources = Resources::open(config)?;
    let reports = run_ingest(&resources.context(config))?;
    print_json(&reports)
}

fn run_enrich_cmd(config: &PipelineConfig) -> Result<()> {
    let resources = Resources::open(config)?;
    let summary = run_enrich(&resources.context(config))?;
    print_json(&summary)
}

fn run_pipeline_cmd(config: &PipelineConfig) -> Result<()> {
    let resources = Resources::open(config)?;
    let summary = run_pipeline(&resources.context(config))?;
    print_json(&summary)
}

fn run_tag(config: &PipelineConfig, source: NewsSource, date: String, file: &Path) -> Result<()> {
    let universe = TickerUniverse::from_file(&config.universe_path)
        .with_context(|| format!("loading universe {}", config.universe_path.display()))?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading document {}", file.display()))?;
    let annotator = RuleAnnotator::with_max_chars(config.max_document_chars);
    let tagger = DocumentTagger::new(&annotator, &universe);

    let id = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "0".into());
    let records = tagger.tag(&RawDocument::new(source, id, content, date))?;
    print_json(&records)
}

#[derive(Serialize)]
struct StatusReport {
    store: PathBuf,
    stats: StoreStats,
    cursors: Vec<SourceCursor>,
}

fn run_status(config: &PipelineConfig) -> Result<()> {
    let store = JsonlStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let mut cursors = Vec::new();
    for source in NewsSource::ALL {
        if let Some(cursor) = store.cursor(source)? {
            cursors.push(cursor);
        }
    }
    print_json(&StatusReport {
        store: store.path().to_path_buf(),
        stats: store.stats()?,
        cursors,
    })
}

fn run_compact(config: &PipelineConfig) -> Result<()> {
    let store = JsonlStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let lines = store.compact()?;
    println!("Compacted {} to {lines} lines", store.path().display());
    Ok(())
}
