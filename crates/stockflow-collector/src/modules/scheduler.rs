//! 수집 루프 상태 머신.
//!
//! 긴 sleep을 품은 무한 루프 대신, 쿼터 잔량과 UTC 날짜 경계가 전이를
//! 결정하는 명시적 상태 머신으로 표현합니다. 전이 계산은 시계를 인자로
//! 받는 순수 함수라 실제 sleep 없이 시뮬레이션으로 테스트합니다.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::quota::QuotaState;

/// 수집 루프 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 대기 - 쿼터가 남은 채 패스가 끝남, 다음 주기까지 휴식
    Idle,
    /// 수집 패스 진행 중
    Fetching,
    /// 쿼터 소진 - 다음 UTC 자정까지 대기
    WaitingForReset,
}

/// 수집 패스가 끝난 뒤의 다음 상태.
pub fn after_pass(state: &QuotaState, max_calls_per_day: u32) -> LoopState {
    if state.is_exhausted(max_calls_per_day) {
        LoopState::WaitingForReset
    } else {
        LoopState::Idle
    }
}

/// 다음 쿼터 리셋 시각 (다음 UTC 자정).
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + chrono::Duration::days(1);
    tomorrow.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// 리셋 시각까지 남은 대기 시간.
pub fn until_reset(now: DateTime<Utc>) -> Duration {
    (next_reset(now) - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_reset_is_next_utc_midnight() {
        let now = utc(2024, 1, 1, 15, 30, 45);
        assert_eq!(next_reset(now), utc(2024, 1, 2, 0, 0, 0));

        // 자정 직전도 다음 자정으로
        let late = utc(2024, 1, 1, 23, 59, 59);
        assert_eq!(next_reset(late), utc(2024, 1, 2, 0, 0, 0));

        // 월말/연말 경계
        let eoy = utc(2024, 12, 31, 12, 0, 0);
        assert_eq!(next_reset(eoy), utc(2025, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_until_reset_duration() {
        let now = utc(2024, 1, 1, 23, 0, 0);
        assert_eq!(until_reset(now), Duration::from_secs(3600));
    }

    #[test]
    fn test_exhausted_quota_waits_for_reset() {
        // 한도에 도달한 상태에서는 추가 호출 없이 리셋 대기로 전이
        let state = QuotaState {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            calls_made: 25,
        };
        assert_eq!(state.remaining(25), 0);
        assert_eq!(after_pass(&state, 25), LoopState::WaitingForReset);
    }

    #[test]
    fn test_partial_quota_goes_idle() {
        let state = QuotaState {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            calls_made: 2,
        };
        assert_eq!(after_pass(&state, 25), LoopState::Idle);
    }
}
