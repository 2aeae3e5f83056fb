//! 에러 타입 정의.

use std::fmt;

use stockflow_data::{DataError, ProviderError};

/// Collector 에러 타입
///
/// 파이프라인의 어떤 실패도 프로세스를 끝내지 않는다 - 실패 범위는 진행
/// 중이던 심볼 하나 또는 동기화 호출 하나다. 유일한 예외는 쿼터 파일
/// 영속화 실패(`QuotaFile`): 호출 계수를 잃으면 프로바이더 측 차단 위험이
/// 있으므로 즉시 종료한다.
#[derive(Debug)]
pub enum CollectorError {
    /// 데이터 계층 에러 (저장소 접근 실패, 알 수 없는 컬럼, 시세 없음)
    Data(DataError),
    /// 프로바이더 에러 (전송 실패, 페이로드 손상)
    Provider(ProviderError),
    /// 설정 에러
    Config(String),
    /// 쿼터 파일 영속화 실패 (치명)
    QuotaFile(std::io::Error),
}

impl CollectorError {
    /// 프로세스를 끝내야 하는 에러인지.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QuotaFile(_))
    }
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::Provider(e) => write!(f, "Provider error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::QuotaFile(e) => write!(f, "Quota file error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<ProviderError> for CollectorError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
