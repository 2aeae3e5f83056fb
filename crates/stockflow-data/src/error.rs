//! 데이터 계층 에러 타입.

use thiserror::Error;

/// 저장소 계층 에러.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 에러 (연결 실패 포함)
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),

    /// 닫힌 지표 컬럼 집합에 없거나 스키마에 존재하지 않는 컬럼
    #[error("알 수 없는 컬럼: {0}")]
    UnknownColumn(String),

    /// 해당 심볼의 저장된 시세가 없음
    #[error("저장된 시세 없음: {0}")]
    NoData(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, DataError>;
