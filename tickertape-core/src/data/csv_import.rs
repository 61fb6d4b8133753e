//! CSV price provider: one `{SYMBOL}.csv` per symbol in a directory.
//!
//! Expected header: `date,open,high,low,close,volume[,adj_close]` with ISO
//! dates. A missing `adj_close` column falls back to `close`.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    adj_close: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(path: &Path) -> Result<Vec<RawBar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::CsvImport(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                DataError::CsvImport(format!("{} row {}: {e}", path.display(), line + 2))
            })?;
            bars.push(RawBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.max(0.0).round() as u64,
                adj_close: row.adj_close.unwrap_or(row.close),
            });
        }
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut bars: Vec<RawBar> = Self::read_bars(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if bars.is_empty() {
            return Err(DataError::EmptyWindow {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
