//! 데이터베이스 연결 관리.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::Result;

/// 연결 풀 설정.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 데이터베이스 URL
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// 데몬용 풀 설정 (장시간 실행, 연결 수 적게).
    pub fn for_daemon(url: String) -> Self {
        Self {
            url,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// 단발성 CLI 명령용 풀 설정.
    pub fn for_cli(url: String) -> Self {
        Self {
            url,
            max_connections: 2,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정대로 연결 풀 생성.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// 내부 풀 참조.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
