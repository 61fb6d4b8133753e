//! External collaborators: market data, ticker universe, news documents.

pub mod circuit_breaker;
pub mod csv_import;
pub mod documents;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use documents::{DocumentSource, JsonlDocumentSource, MemoryDocumentSource, SourceError};
pub use provider::{DataError, DataProvider, DataSource, FetchResult, LookbackWindow, RawBar};
pub use synthetic::SyntheticProvider;
pub use universe::{TickerUniverse, UniverseError};
pub use yahoo::YahooProvider;
