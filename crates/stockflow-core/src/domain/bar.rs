//! 일봉(OHLCV) 도메인 객체.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 하루치 OHLCV 레코드.
///
/// 자연키는 `(date, symbol)`이며, 같은 키로 재수집하면 가격/거래량 필드만
/// 덮어씁니다 (행이 중복 생성되지 않음).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 거래일
    pub date: NaiveDate,
    /// 종목 코드 (예: "NVDA")
    pub symbol: String,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량 (0 이상)
    pub volume: i64,
}
