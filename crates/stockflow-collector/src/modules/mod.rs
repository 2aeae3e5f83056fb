//! 수집 워크플로우 모듈.

pub mod bar_collect;
pub mod indicator_backfill;
pub mod quota;
pub mod scheduler;

pub use bar_collect::collect_bars;
pub use indicator_backfill::{backfill_symbol, sync_indicators};
pub use quota::{QuotaState, QuotaTracker};
pub use scheduler::{after_pass, next_reset, until_reset, LoopState};
