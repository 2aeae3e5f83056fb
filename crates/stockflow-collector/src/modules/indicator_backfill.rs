//! 지표 백필 모듈.
//!
//! 저장된 종가 이력 전체로 RSI/이동평균 시계열을 계산해, 같은 행의 지표
//! 컬럼에 컬럼 동기화로 기록합니다. 지표 수학 자체는 `ta` crate가 담당하고
//! 이 모듈은 윈도잉과 워밍업 처리만 조율합니다.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};
use ta::Next;
use tracing::{debug, info, warn};

use stockflow_core::{IndicatorColumn, IndicatorPoint};
use stockflow_data::{BarStore, DataError};

use crate::{
    config::CollectorConfig,
    error::{CollectorError, Result},
    stats::CollectionStats,
};

/// 종가 시계열에 대한 지표 계산.
///
/// 반환 벡터는 입력과 길이가 같고, 워밍업 구간(관측치 부족으로 지표가
/// 정의되지 않는 선두 구간)은 `None`입니다.
pub fn compute_series(
    column: IndicatorColumn,
    closes: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>> {
    let warmup = column.warmup_len(window);

    match column {
        IndicatorColumn::Rsi => {
            let rsi = RelativeStrengthIndex::new(window)
                .map_err(|e| CollectorError::Config(format!("RSI 윈도우 오류: {e}")))?;
            Ok(run_indicator(rsi, closes, warmup))
        }
        IndicatorColumn::MovingAverage => {
            let sma = SimpleMovingAverage::new(window)
                .map_err(|e| CollectorError::Config(format!("이동평균 윈도우 오류: {e}")))?;
            Ok(run_indicator(sma, closes, warmup))
        }
    }
}

/// 지표를 종가 순서대로 밀면서 워밍업 구간을 None으로 마스킹.
fn run_indicator<I>(mut indicator: I, closes: &[f64], warmup: usize) -> Vec<Option<f64>>
where
    I: Next<f64, Output = f64>,
{
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let value = indicator.next(close);
            (i >= warmup).then_some(value)
        })
        .collect()
}

/// 정의된 지표 값만 포인트로 변환.
///
/// 워밍업 구간은 버려집니다 - 디스크에 0이나 NaN 센티널을 남기지 않고
/// 해당 날짜의 지표 컬럼을 아예 비워 둡니다.
pub fn prepare_points(
    symbol: &str,
    dates: &[NaiveDate],
    series: &[Option<f64>],
) -> Vec<IndicatorPoint> {
    dates
        .iter()
        .zip(series)
        .filter_map(|(date, value)| {
            value.map(|v| IndicatorPoint {
                date: *date,
                symbol: symbol.to_string(),
                value: v,
            })
        })
        .collect()
}

/// 단일 심볼, 단일 지표 컬럼 백필.
///
/// 저장된 일봉이 하나도 없으면 `NoData`로 실패합니다.
/// 기록된 포인트 수를 반환합니다.
pub async fn backfill_symbol(
    store: &BarStore,
    symbol: &str,
    column: IndicatorColumn,
    window: usize,
) -> Result<usize> {
    let history = store.close_history(symbol).await?;
    if history.is_empty() {
        return Err(CollectorError::Data(DataError::NoData(symbol.to_string())));
    }

    let dates: Vec<NaiveDate> = history.iter().map(|(date, _)| *date).collect();
    let closes: Vec<f64> = history
        .iter()
        .map(|(_, close)| close.to_f64().unwrap_or_default())
        .collect();

    let series = compute_series(column, &closes, window)?;
    let points = prepare_points(symbol, &dates, &series);

    if points.is_empty() {
        // 이력 전체가 워밍업 구간 - 기록할 것이 없음
        debug!(
            symbol = %symbol,
            column = %column,
            bars = history.len(),
            window = window,
            "지표가 정의되는 구간 없음"
        );
        return Ok(0);
    }

    let report = store.sync_column(column, &points).await?;
    debug!(
        symbol = %symbol,
        column = %column,
        written = report.written,
        skipped = report.skipped,
        "지표 백필 완료"
    );
    Ok(report.written)
}

/// 대상 심볼 전체에 대한 지표 백필 워크플로우.
///
/// # 인자
/// * `symbols` - 특정 심볼 지정 (쉼표 구분), None이면 설정값 전체
/// * `column` - 특정 지표만 처리, None이면 닫힌 컬럼 집합 전체
pub async fn sync_indicators(
    store: &BarStore,
    config: &CollectorConfig,
    symbols: Option<String>,
    column: Option<IndicatorColumn>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let target_symbols: Vec<String> = match symbols {
        Some(ref s) => s
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.fetch.symbols.clone(),
    };
    stats.total = target_symbols.len();

    let columns: Vec<IndicatorColumn> = match column {
        Some(c) => vec![c],
        None => IndicatorColumn::ALL.to_vec(),
    };

    info!(
        symbols = target_symbols.len(),
        columns = ?columns.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        window = config.indicator.window,
        "지표 백필 시작"
    );

    'symbols: for symbol in &target_symbols {
        let mut wrote = 0usize;
        let mut failed = false;

        for &col in &columns {
            match backfill_symbol(store, symbol, col, config.indicator.window).await {
                Ok(n) => wrote += n,
                Err(CollectorError::Data(DataError::NoData(_))) => {
                    // 저장된 시세가 없으면 어떤 지표도 계산 불가
                    debug!(symbol = %symbol, "저장된 시세 없음 - 백필 건너뜀");
                    stats.skipped += 1;
                    continue 'symbols;
                }
                Err(e) => {
                    warn!(symbol = %symbol, column = %col, error = %e, "지표 백필 실패");
                    failed = true;
                }
            }
        }

        if failed {
            stats.errors += 1;
        } else if wrote > 0 {
            stats.success += 1;
            stats.total_rows += wrote;
        } else {
            // 이력은 있으나 전부 워밍업 구간
            stats.empty += 1;
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_rsi_warmup_shorter_than_window_yields_nothing() {
        // 10개 종가, 윈도우 14 → 전부 워밍업, 기록할 포인트 없음
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let series = compute_series(IndicatorColumn::Rsi, &closes, 14).unwrap();
        assert_eq!(series.len(), 10);
        assert!(series.iter().all(Option::is_none));

        let points = prepare_points("NVDA", &dates(10), &series);
        assert!(points.is_empty());
    }

    #[test]
    fn test_rsi_first_defined_at_window() {
        // RSI는 window+1개째 관측치부터 정의됨
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = compute_series(IndicatorColumn::Rsi, &closes, 14).unwrap();

        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_sma_values_and_warmup() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let series = compute_series(IndicatorColumn::MovingAverage, &closes, 3).unwrap();

        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(2.0));
        assert_eq!(series[3], Some(3.0));
        assert_eq!(series[4], Some(4.0));
    }

    #[test]
    fn test_prepare_points_keeps_date_alignment() {
        let ds = dates(5);
        let series = vec![None, None, Some(2.0), Some(3.0), Some(4.0)];
        let points = prepare_points("AMD", &ds, &series);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, ds[2]);
        assert_eq!(points[0].value, 2.0);
        assert_eq!(points[2].date, ds[4]);
        assert!(points.iter().all(|p| p.symbol == "AMD"));
    }

    #[test]
    fn test_zero_window_is_config_error() {
        let closes = [1.0, 2.0];
        assert!(compute_series(IndicatorColumn::Rsi, &closes, 0).is_err());
        assert!(compute_series(IndicatorColumn::MovingAverage, &closes, 0).is_err());
    }
}
