//! 저장소 모듈.

pub mod bars;

pub use bars::{BarStore, SyncReport};
