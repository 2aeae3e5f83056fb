//! 일봉 수집 모듈.
//!
//! 설정된 심볼을 순서대로 돌며 프로바이더에서 시계열을 조회하고, 정규화한
//! 일봉을 저장소에 upsert합니다. 매 호출 전에 쿼터를 확인하고, 호출 간에는
//! 분당 한도에 맞춘 고정 대기를 둡니다. 심볼 하나의 실패는 로그만 남기고
//! 다음 심볼로 진행합니다.
//!
//! 병렬 fan-out은 없습니다 - 분당/일일 한도가 빠듯해서 동시 호출은 한도
//! 위반만 부릅니다.

use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use stockflow_data::{normalize, BarSeriesProvider, BarStore};

use crate::{
    config::CollectorConfig,
    modules::quota::QuotaTracker,
    stats::CollectionStats,
    Result,
};

/// 심볼 목록을 한 바퀴 도는 단일 수집 패스.
///
/// 쿼터 상태를 로드해 새 UTC 날짜면 리셋하고, 한도에 도달하면 남은 심볼을
/// 조회 없이 건너뜁니다. 실패한 호출도 쿼터를 1 소모합니다 - 프로바이더는
/// 요청 자체를 계수하기 때문입니다.
///
/// # 인자
/// * `symbols` - 특정 심볼 지정 (쉼표 구분), None이면 설정값 전체
pub async fn collect_bars(
    store: &BarStore,
    provider: &dyn BarSeriesProvider,
    tracker: &QuotaTracker,
    config: &CollectorConfig,
    symbols: Option<String>,
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

    if target_symbols.is_empty() {
        warn!("수집할 심볼이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let now = Utc::now();
    let mut state = tracker.load(now)?;
    if state.is_new_day(now) {
        tracker.reset(&mut state, now)?;
    }

    info!(
        symbols = target_symbols.len(),
        calls_made = state.calls_made,
        remaining = state.remaining(config.fetch.max_calls_per_day),
        "일봉 수집 시작"
    );

    let kind = config.provider.series_kind;
    let request_delay = config.fetch.request_delay();

    for (idx, symbol) in target_symbols.iter().enumerate() {
        // 매 호출 전 쿼터 확인 - 소진이면 남은 심볼 전부 건너뜀 (실패 아님)
        if state.is_exhausted(config.fetch.max_calls_per_day) {
            let left = target_symbols.len() - idx;
            info!(
                calls_made = state.calls_made,
                skipped = left,
                "일일 호출 한도 도달 - 남은 심볼 건너뜀"
            );
            stats.skipped += left;
            break;
        }

        info!(symbol = %symbol, "시계열 조회");
        let fetched = provider.fetch_series(symbol, kind).await;

        // 성공/실패 모두 호출 1회로 계상 - 영속화 실패는 치명이므로 전파
        tracker.record_call(&mut state)?;

        match fetched {
            Ok(payload) => match normalize(symbol, kind, &payload) {
                Ok(bars) if bars.is_empty() => {
                    stats.empty += 1;
                    warn!(symbol = %symbol, "시계열이 비어 있음");
                }
                Ok(bars) => match store.upsert_bars(&bars).await {
                    Ok(_) => {
                        stats.success += 1;
                        stats.total_rows += bars.len();
                        info!(symbol = %symbol, bars = bars.len(), "수집 완료");
                    }
                    Err(e) => {
                        stats.errors += 1;
                        error!(symbol = %symbol, error = %e, "일봉 저장 실패");
                    }
                },
                Err(e) => {
                    // 페이로드 형태 문제 - 이번 주기에서 이 심볼만 제외
                    stats.errors += 1;
                    warn!(symbol = %symbol, error = %e, "페이로드 정규화 실패");
                }
            },
            Err(e) => {
                stats.errors += 1;
                warn!(symbol = %symbol, error = %e, "시계열 조회 실패");
            }
        }

        // 분당 호출 한도 페이싱
        tokio::time::sleep(request_delay).await;
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
