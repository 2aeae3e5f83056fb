//! 시세 저장소와 외부 데이터 프로바이더.

pub mod database;
pub mod error;
pub mod provider;
pub mod storage;

pub use database::{Database, DatabaseConfig};
pub use error::{DataError, Result};
pub use provider::alpha_vantage::{
    normalize, AlphaVantageClient, BarSeriesProvider, ProviderError, SeriesKind,
};
pub use storage::bars::{BarStore, SyncReport};
