//! Stockflow 공통 도메인 타입.

pub mod domain;

pub use domain::bar::DailyBar;
pub use domain::indicator::{IndicatorColumn, IndicatorPoint, UnknownColumnName};
