//! 외부 시세 데이터 프로바이더.

pub mod alpha_vantage;

pub use alpha_vantage::{normalize, AlphaVantageClient, BarSeriesProvider, ProviderError, SeriesKind};
