//! 파생 지표 컬럼과 지표 포인트.
//!
//! 지표 컬럼 집합은 닫힌 enum으로 관리합니다. 컬럼명을 데이터로 다루면
//! 오타 하나로 의도하지 않은 컬럼이 생기거나 다른 컬럼을 덮어쓸 수 있으므로,
//! 경계에서 파싱을 거부하고 SQL에는 enum의 고정 문자열만 들어갑니다.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 지원하는 파생 지표 컬럼.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorColumn {
    /// RSI (Relative Strength Index)
    Rsi,
    /// 단순 이동평균
    MovingAverage,
}

impl IndicatorColumn {
    /// 전체 지표 컬럼 목록 (백필 순서 고정).
    pub const ALL: [IndicatorColumn; 2] = [IndicatorColumn::Rsi, IndicatorColumn::MovingAverage];

    /// DB 컬럼명.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorColumn::Rsi => "rsi",
            IndicatorColumn::MovingAverage => "moving_average",
        }
    }

    /// 지표가 정의되지 않는 워밍업 구간 길이.
    ///
    /// RSI는 첫 값 계산에 `window + 1`개 관측치가 필요하고,
    /// 단순 이동평균은 `window`개면 충분합니다.
    pub fn warmup_len(&self, window: usize) -> usize {
        match self {
            IndicatorColumn::Rsi => window,
            IndicatorColumn::MovingAverage => window.saturating_sub(1),
        }
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 닫힌 컬럼 집합에 없는 이름.
#[derive(Debug, Clone, thiserror::Error)]
#[error("알 수 없는 지표 컬럼: {0}")]
pub struct UnknownColumnName(pub String);

impl FromStr for IndicatorColumn {
    type Err = UnknownColumnName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsi" => Ok(IndicatorColumn::Rsi),
            "moving_average" => Ok(IndicatorColumn::MovingAverage),
            other => Err(UnknownColumnName(other.to_string())),
        }
    }
}

/// 지표 계산 결과 한 점.
///
/// `DailyBar`와 같은 자연키 `(date, symbol)`를 가지며, 같은 논리 행의
/// 지표 컬럼에만 기록됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    /// 거래일
    pub date: NaiveDate,
    /// 종목 코드
    pub symbol: String,
    /// 지표 값
    pub value: f64,
}
