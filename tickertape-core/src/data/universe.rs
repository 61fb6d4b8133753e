//! Ticker universe: the fund holdings list that defines which symbols are tracked.
//!
//! Stored as a TOML file:
//!
//! ```toml
//! fund = "VOO"
//! tickers = ["AAPL", "MSFT", "BRK.B"]
//! ```
//!
//! Symbols containing a dot are held in underscore form (`BRK_B`) because
//! that is how they survive text normalization; `market_symbol` maps them
//! back for price lookups.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UniverseFile {
    #[serde(default)]
    fund: String,
    tickers: Vec<String>,
}

/// Point-in-time snapshot of valid ticker symbols.
#[derive(Debug, Clone, Default)]
pub struct TickerUniverse {
    fund: String,
    tickers: Vec<String>,
    members: HashSet<String>,
}

impl TickerUniverse {
    /// Build a universe, normalizing `.` to `_`, dropping blanks and duplicates.
    pub fn new<I, S>(fund: impl Into<String>, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut members = HashSet::new();
        for raw in tickers {
            let ticker = Self::universe_symbol(raw.as_ref());
            if ticker.is_empty() {
                continue;
            }
            if members.insert(ticker.clone()) {
                ordered.push(ticker);
            }
        }
        Self {
            fund: fund.into(),
            tickers: ordered,
            members,
        }
    }

    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let file: UniverseFile = toml::from_str(content)?;
        Ok(Self::new(file.fund, file.tickers))
    }

    /// Serialize the universe to TOML (market symbols, i.e. dotted form).
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        let file = UniverseFile {
            fund: self.fund.clone(),
            tickers: self.tickers.iter().map(|t| Self::market_symbol(t)).collect(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// `BRK.B` -> `BRK_B`.
    pub fn universe_symbol(symbol: &str) -> String {
        symbol.trim().replace('.', "_")
    }

    /// `BRK_B` -> `BRK.B`.
    pub fn market_symbol(ticker: &str) -> String {
        ticker.replace('_', ".")
    }

    pub fn fund(&self) -> &str {
        &self.fund
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.members.contains(ticker)
    }

    /// Tickers in holdings-list order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Tickers whose market symbol contains a dot.
    pub fn dotted_tickers(&self) -> impl Iterator<Item = &str> {
        self.tickers
            .iter()
            .filter(|t| t.contains('_'))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_dedups_in_order() {
        let u = TickerUniverse::new("VOO", ["MSFT", "AAPL", "BRK.B", "MSFT", " ", "BRK_B"]);
        assert_eq!(u.tickers(), &["MSFT", "AAPL", "BRK_B"]);
        assert!(u.contains("BRK_B"));
        assert!(!u.contains("BRK.B"));
        assert_eq!(u.len(), 3);
    }

    #[test]
    fn market_symbol_restores_dot() {
        assert_eq!(TickerUniverse::market_symbol("BRK_B"), "BRK.B");
        assert_eq!(TickerUniverse::market_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn dotted_tickers_listed() {
        let u = TickerUniverse::new("VOO", ["AAPL", "BF.B", "BRK.B"]);
        assert_eq!(u.dotted_tickers().collect::<Vec<_>>(), vec!["BF_B", "BRK_B"]);
    }

    #[test]
    fn toml_roundtrip() {
        let u = TickerUniverse::new("VOO", ["AAPL", "BRK.B"]);
        let text = u.to_toml().unwrap();
        assert!(text.contains("BRK.B"));
        let parsed = TickerUniverse::from_toml(&text).unwrap();
        assert_eq!(parsed.tickers(), u.tickers());
        assert_eq!(parsed.fund(), "VOO");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = TickerUniverse::from_file(Path::new("/nonexistent/universe.toml")).unwrap_err();
        assert!(matches!(err, UniverseError::Read { .. }));
    }
}
