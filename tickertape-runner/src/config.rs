//! Pipeline configuration loaded from TOML.
//!
//! ```toml
//! store_path = "data/sentences.jsonl"
//! documents_dir = "data/news"
//! universe_path = "universe.toml"
//! sources = ["SeekingAlpha", "Zacks"]
//! workers = 100
//! lookback_days = 365
//! index_symbol = "VIXY"
//!
//! [provider]
//! kind = "csv"
//! dir = "data/prices"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickertape_core::data::{
    CircuitBreaker, CsvProvider, DataError, DataProvider, LookbackWindow, SyntheticProvider,
    YahooProvider,
};
use tickertape_core::domain::NewsSource;
use tickertape_core::text::RuleAnnotator;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for ticker and market enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Worker threads; tickers are split round-robin across them.
    pub workers: usize,
    /// Length of the price window fetched per ticker, in calendar days.
    pub lookback_days: u32,
    /// Volatility index used for market enrichment.
    pub index_symbol: String,
    /// End of the price window. Defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: 100,
            lookback_days: 365,
            index_symbol: "VIXY".into(),
            as_of: None,
        }
    }
}

impl EnrichmentConfig {
    pub fn as_of_or_today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn window(&self) -> LookbackWindow {
        LookbackWindow::trailing(self.as_of_or_today(), self.lookback_days)
    }
}

/// Which market-data provider to build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    #[default]
    Yahoo,
    Csv {
        dir: PathBuf,
    },
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
}

impl ProviderConfig {
    pub fn build(&self) -> Result<Box<dyn DataProvider>, DataError> {
        Ok(match self {
            ProviderConfig::Yahoo => Box::new(YahooProvider::new(Arc::new(
                CircuitBreaker::default_provider(),
            ))?),
            ProviderConfig::Csv { dir } => Box::new(CsvProvider::new(dir.clone())),
            ProviderConfig::Synthetic { seed } => Box::new(SyntheticProvider::new(*seed)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub store_path: PathBuf,
    pub documents_dir: PathBuf,
    pub universe_path: PathBuf,
    /// Sources ingested, in this order.
    pub sources: Vec<NewsSource>,
    /// Longest decoded document (in chars) handed to the annotator.
    pub max_document_chars: usize,
    #[serde(flatten)]
    pub enrichment: EnrichmentConfig,
    pub provider: ProviderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/sentences.jsonl"),
            documents_dir: PathBuf::from("data/news"),
            universe_path: PathBuf::from("universe.toml"),
            sources: NewsSource::ALL.to_vec(),
            max_document_chars: RuleAnnotator::DEFAULT_MAX_CHARS,
            enrichment: EnrichmentConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrichment.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.enrichment.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be at least 1".into()));
        }
        if self.enrichment.index_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("index_symbol must not be empty".into()));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("at least one source is required".into()));
        }
        if self.max_document_chars == 0 {
            return Err(ConfigError::Invalid("max_document_chars must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_settings() {
        let c = PipelineConfig::default();
        assert_eq!(c.enrichment.workers, 100);
        assert_eq!(c.enrichment.lookback_days, 365);
        assert_eq!(c.enrichment.index_symbol, "VIXY");
        assert_eq!(c.provider, ProviderConfig::Yahoo);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_flat_enrichment_keys_and_provider_table() {
        let c = PipelineConfig::from_toml(
            r#"
            store_path = "out/s.jsonl"
            sources = ["Zacks"]
            workers = 8
            as_of = "2021-03-31"

            [provider]
            kind = "csv"
            dir = "prices"
            "#,
        )
        .unwrap();
        assert_eq!(c.store_path, PathBuf::from("out/s.jsonl"));
        assert_eq!(c.sources, vec![NewsSource::Zacks]);
        assert_eq!(c.enrichment.workers, 8);
        assert_eq!(c.enrichment.lookback_days, 365);
        assert_eq!(
            c.provider,
            ProviderConfig::Csv {
                dir: PathBuf::from("prices")
            }
        );
        let w = c.enrichment.window();
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2021, 3, 31).unwrap());
    }

    #[test]
    fn rejects_zero_workers() {
        let err = PipelineConfig::from_toml("workers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_sources() {
        assert!(PipelineConfig::from_toml("sources = []").is_err());
    }

    #[test]
    fn synthetic_provider_builds_offline() {
        let p = ProviderConfig::Synthetic { seed: 3 }.build().unwrap();
        assert_eq!(p.name(), "synthetic");
    }
}
