//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use stockflow_data::SeriesKind;

use crate::{CollectorError, Result};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 프로바이더 설정
    pub provider: ProviderConfig,
    /// 수집 루프 설정
    pub fetch: FetchConfig,
    /// 지표 설정
    pub indicator: IndicatorConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 시세 프로바이더 설정
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API 키
    pub api_key: String,
    /// API 엔드포인트
    pub base_url: String,
    /// 조회 시계열 종류 (daily | monthly)
    pub series_kind: SeriesKind,
}

/// 수집 루프 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 수집 대상 심볼 (순서 고정)
    pub symbols: Vec<String>,
    /// 일일 최대 호출 수 (무료 플랜 기준 25)
    pub max_calls_per_day: u32,
    /// 호출 간 최소 대기 (초). 분당 5회 제한이라 60/5 = 12초
    pub min_seconds_between_calls: u64,
    /// 쿼터 추적 파일 경로
    pub quota_file: PathBuf,
}

/// 지표 계산 설정
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// RSI/이동평균 윈도우
    pub window: usize,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 쿼터가 남은 채 패스가 끝났을 때 다음 패스까지 대기 (분)
    pub idle_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            CollectorError::Config(
                "ALPHA_VANTAGE_API_KEY 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let series_kind = match std::env::var("API_SERIES_KIND")
            .unwrap_or_else(|_| "daily".to_string())
            .to_lowercase()
            .as_str()
        {
            "daily" => SeriesKind::Daily,
            "monthly" => SeriesKind::Monthly,
            other => {
                return Err(CollectorError::Config(format!(
                    "지원하지 않는 시계열 종류: {other} (daily | monthly)"
                )))
            }
        };

        Ok(Self {
            database_url,
            provider: ProviderConfig {
                api_key,
                base_url: std::env::var("ALPHA_VANTAGE_BASE_URL")
                    .unwrap_or_else(|_| "https://www.alphavantage.co/query".to_string()),
                series_kind,
            },
            fetch: FetchConfig {
                symbols: env_var_list_or_default(
                    "SYMBOLS",
                    vec!["NVDA".to_string(), "AMD".to_string()],
                ),
                max_calls_per_day: env_var_parse("API_MAX_CALLS_PER_DAY", 25),
                min_seconds_between_calls: env_var_parse("API_MIN_SECONDS_BETWEEN_CALLS", 12),
                quota_file: PathBuf::from(
                    std::env::var("QUOTA_TRACKER_PATH")
                        .unwrap_or_else(|_| "api_calls_tracker.json".to_string()),
                ),
            },
            indicator: IndicatorConfig {
                window: env_var_parse("INDICATOR_WINDOW", 14),
            },
            daemon: DaemonConfig {
                idle_minutes: env_var_parse("DAEMON_IDLE_MINUTES", 60),
            },
        })
    }
}

impl FetchConfig {
    /// 호출 간 대기를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.min_seconds_between_calls)
    }
}

impl DaemonConfig {
    /// 유휴 대기를 Duration으로 반환
    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 쉼표로 구분된 리스트 파싱 (기본값 지원)
fn env_var_list_or_default(key: &str, default: Vec<String>) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(default)
}
