//! API 호출 쿼터 추적.
//!
//! 일일 호출 계수를 JSON 파일로 영속화합니다. 프로세스가 재시작해도
//! 그날 이미 쓴 호출 수를 기억해야 프로바이더 한도를 넘지 않습니다.
//!
//! 상태는 명시적 값으로 로드 → 변이 → 저장을 오갑니다. 전역 싱글턴이
//! 아니므로 날짜 리셋 규칙을 시계만 바꿔가며 단독으로 테스트할 수
//! 있습니다. 소유권은 수집 루프 하나 - 동시 기록자는 없습니다.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CollectorError, Result};

/// 하루치 호출 쿼터 상태.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// 기준일 (UTC 달력 날짜)
    pub day: NaiveDate,
    /// 해당 일자에 시도한 호출 수
    pub calls_made: u32,
}

impl QuotaState {
    /// 현재 UTC 날짜의 새 상태.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            calls_made: 0,
        }
    }

    /// 저장된 기준일이 현재 UTC 달력 날짜와 다른지.
    ///
    /// 시각이 아니라 달력 날짜만 비교한다 - 같은 날의 어떤 시각이든
    /// 같은 날로 취급해야 실행할 때마다 리셋되는 일이 없다.
    pub fn is_new_day(&self, now: DateTime<Utc>) -> bool {
        self.day != now.date_naive()
    }

    /// 남은 호출 수.
    pub fn remaining(&self, max_calls_per_day: u32) -> u32 {
        max_calls_per_day.saturating_sub(self.calls_made)
    }

    /// 일일 한도 도달 여부.
    pub fn is_exhausted(&self, max_calls_per_day: u32) -> bool {
        self.calls_made >= max_calls_per_day
    }
}

/// 쿼터 상태 영속화.
///
/// 모든 변이 직후 동기적으로 저장하므로, 크래시로 잃을 수 있는 것은
/// 진행 중이던 호출 한 건의 계수뿐입니다. 파일 기록 실패는 치명 에러로
/// 전파됩니다 - 계수를 잃은 채 계속 호출하면 프로바이더 측 차단을
/// 부를 수 있습니다.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    path: PathBuf,
}

impl QuotaTracker {
    /// 추적 파일 경로로 트래커 생성.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 저장된 상태 로드. 파일이 없으면 오늘 날짜의 빈 상태.
    pub fn load(&self, now: DateTime<Utc>) -> Result<QuotaState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "쿼터 파일 없음 - 새 상태로 시작");
                return Ok(QuotaState::fresh(now));
            }
            Err(e) => return Err(CollectorError::QuotaFile(e)),
        };

        let state: QuotaState = serde_json::from_str(&raw).map_err(|e| {
            CollectorError::QuotaFile(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        Ok(state)
    }

    /// 상태를 동기적으로 저장.
    pub fn save(&self, state: &QuotaState) -> Result<()> {
        let raw = serde_json::to_string(state).map_err(|e| {
            CollectorError::QuotaFile(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        fs::write(&self.path, raw).map_err(CollectorError::QuotaFile)
    }

    /// 오늘 날짜로 리셋하고 저장.
    pub fn reset(&self, state: &mut QuotaState, now: DateTime<Utc>) -> Result<()> {
        info!(old_day = %state.day, new_day = %now.date_naive(), "쿼터 리셋");
        *state = QuotaState::fresh(now);
        self.save(state)
    }

    /// 호출 1회 계상하고 저장.
    pub fn record_call(&self, state: &mut QuotaState) -> Result<()> {
        state.calls_made += 1;
        self.save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn tracker_in(dir: &tempfile::TempDir) -> QuotaTracker {
        QuotaTracker::new(dir.path().join("api_calls_tracker.json"))
    }

    #[test]
    fn test_load_missing_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);
        let now = utc(2024, 1, 1, 9, 0, 0);

        let state = tracker.load(now).unwrap();
        assert_eq!(state.day, now.date_naive());
        assert_eq!(state.calls_made, 0);
    }

    #[test]
    fn test_record_call_increments_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);
        let now = utc(2024, 1, 1, 9, 0, 0);

        let mut state = tracker.load(now).unwrap();
        tracker.record_call(&mut state).unwrap();
        assert_eq!(state.calls_made, 1);

        // 디스크에서 다시 읽어도 같은 값이어야 함
        let reloaded = tracker.load(now).unwrap();
        assert_eq!(reloaded, state);

        tracker.record_call(&mut state).unwrap();
        assert_eq!(tracker.load(now).unwrap().calls_made, 2);
    }

    #[test]
    fn test_is_new_day_ignores_time_of_day() {
        let state = QuotaState {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            calls_made: 10,
        };

        // 같은 UTC 날짜면 시각이 달라도 같은 날
        assert!(!state.is_new_day(utc(2024, 1, 1, 0, 0, 0)));
        assert!(!state.is_new_day(utc(2024, 1, 1, 12, 34, 56)));
        assert!(!state.is_new_day(utc(2024, 1, 1, 23, 59, 59)));

        // 자정을 넘으면 새 날
        assert!(state.is_new_day(utc(2024, 1, 2, 0, 0, 0)));
        assert!(state.is_new_day(utc(2023, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn test_reset_persists_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        let mut state = QuotaState {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            calls_made: 25,
        };
        let next_day = utc(2024, 1, 2, 0, 5, 0);
        tracker.reset(&mut state, next_day).unwrap();

        assert_eq!(state.calls_made, 0);
        assert_eq!(state.day, next_day.date_naive());
        assert_eq!(tracker.load(next_day).unwrap(), state);
    }

    #[test]
    fn test_remaining_and_exhausted() {
        let mut state = QuotaState {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            calls_made: 24,
        };
        assert_eq!(state.remaining(25), 1);
        assert!(!state.is_exhausted(25));

        state.calls_made = 25;
        assert_eq!(state.remaining(25), 0);
        assert!(state.is_exhausted(25));

        state.calls_made = 30;
        assert_eq!(state.remaining(25), 0);
        assert!(state.is_exhausted(25));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_calls_tracker.json");
        fs::write(&path, "not json").unwrap();

        let tracker = QuotaTracker::new(path);
        assert!(tracker.load(utc(2024, 1, 1, 0, 0, 0)).is_err());
    }
}
