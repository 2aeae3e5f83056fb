//! 일봉 테이블 접근.
//!
//! `daily_bars` 테이블 하나에 원시 OHLCV와 파생 지표 컬럼이 함께 삽니다.
//! 자연키는 `(date, symbol)`이고 모든 쓰기는 upsert이므로 재실행해도
//! 행이 중복되거나 다른 컬럼이 훼손되지 않습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use tracing::{debug, warn};

use stockflow_core::{DailyBar, IndicatorColumn, IndicatorPoint};

use crate::error::{DataError, Result};

/// 시세 테이블명.
const BARS_TABLE: &str = "daily_bars";

/// 배치 upsert 묶음 크기.
const BATCH_SIZE: usize = 500;

/// 컬럼 동기화 결과.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    /// 기록된 행 수
    pub written: usize,
    /// 실패하여 건너뛴 행 수
    pub skipped: usize,
}

/// 일봉 저장소.
#[derive(Clone)]
pub struct BarStore {
    pool: PgPool,
}

impl BarStore {
    /// 새 저장소 핸들 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 스키마 부트스트랩.
    ///
    /// 테이블이 없으면 만들고, 닫힌 지표 컬럼 집합 중 아직 없는 컬럼을
    /// 추가합니다. 지표 컬럼은 nullable - 워밍업 구간은 행 자체를 쓰지
    /// 않으므로 센티널 값이 디스크에 남지 않습니다.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_bars (
                date DATE NOT NULL,
                symbol VARCHAR(16) NOT NULL,
                open NUMERIC(18, 6),
                high NUMERIC(18, 6),
                low NUMERIC(18, 6),
                close NUMERIC(18, 6),
                volume BIGINT,
                fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (date, symbol)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for column in IndicatorColumn::ALL {
            let ddl = format!(
                "ALTER TABLE {BARS_TABLE} ADD COLUMN IF NOT EXISTS {} DOUBLE PRECISION",
                column.as_str()
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }

        debug!("스키마 확인 완료");
        Ok(())
    }

    /// 일봉 배치 upsert.
    ///
    /// 가격/거래량 필드만 갱신하고 지표 컬럼은 건드리지 않습니다.
    pub async fn upsert_bars(&self, bars: &[DailyBar]) -> Result<u64> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut total_affected = 0u64;

        for chunk in bars.chunks(BATCH_SIZE) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT INTO daily_bars (date, symbol, open, high, low, close, volume) ",
            );

            query_builder.push_values(chunk, |mut b, bar| {
                b.push_bind(bar.date)
                    .push_bind(&bar.symbol)
                    .push_bind(bar.open)
                    .push_bind(bar.high)
                    .push_bind(bar.low)
                    .push_bind(bar.close)
                    .push_bind(bar.volume);
            });

            query_builder.push(
                " ON CONFLICT (date, symbol) DO UPDATE SET \
                 open = EXCLUDED.open, \
                 high = EXCLUDED.high, \
                 low = EXCLUDED.low, \
                 close = EXCLUDED.close, \
                 volume = EXCLUDED.volume, \
                 fetched_at = NOW()",
            );

            let result = query_builder.build().execute(&self.pool).await?;
            total_affected += result.rows_affected();
        }

        Ok(total_affected)
    }

    /// 테이블에 해당 컬럼이 존재하는지 확인.
    pub async fn column_exists(&self, column: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_name = $1 AND column_name = $2
            )
            "#,
        )
        .bind(BARS_TABLE)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// 단일 지표 컬럼 동기화.
    ///
    /// `(date, symbol)` 키로 해당 컬럼만 upsert합니다. 행이 없으면 키와
    /// 지표 값만 가진 행이 새로 생기고, 있으면 그 컬럼만 갱신됩니다.
    /// 같은 포인트로 재실행해도 결과가 같고, 다른 지표 컬럼은 변하지
    /// 않습니다.
    ///
    /// 개별 행 실패는 로그 후 건너뛰므로 포인트 하나가 배치 전체를
    /// 중단시키지 않습니다.
    pub async fn sync_column(
        &self,
        column: IndicatorColumn,
        points: &[IndicatorPoint],
    ) -> Result<SyncReport> {
        // 컬럼 집합은 닫혀 있지만 스키마가 지표 추가 이전일 수 있으므로
        // 쓰기 전에 실제 존재 여부를 확인한다
        if !self.column_exists(column.as_str()).await? {
            return Err(DataError::UnknownColumn(column.as_str().to_string()));
        }

        // 컬럼명은 enum의 고정 문자열이라 외부 입력이 SQL에 들어갈 수 없음.
        // 행이 없으면 키와 지표 값만 가진 행이 생긴다 (가격 필드는 NULL 유지).
        let sql = format!(
            "INSERT INTO {BARS_TABLE} (date, symbol, {col}) VALUES ($1, $2, $3) \
             ON CONFLICT (date, symbol) DO UPDATE SET {col} = EXCLUDED.{col}",
            col = column.as_str()
        );

        let mut report = SyncReport::default();
        for point in points {
            let result = sqlx::query(&sql)
                .bind(point.date)
                .bind(&point.symbol)
                .bind(point.value)
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => report.written += 1,
                Err(e) => {
                    warn!(
                        symbol = %point.symbol,
                        date = %point.date,
                        column = %column,
                        error = %e,
                        "지표 행 기록 실패 - 건너뜀"
                    );
                    report.skipped += 1;
                }
            }
        }

        debug!(
            column = %column,
            written = report.written,
            skipped = report.skipped,
            "컬럼 동기화 완료"
        );
        Ok(report)
    }

    /// 심볼의 전체 종가 이력을 날짜 오름차순으로 조회.
    pub async fn close_history(&self, symbol: &str) -> Result<Vec<(NaiveDate, Decimal)>> {
        let rows: Vec<(NaiveDate, Decimal)> = sqlx::query_as(
            r#"
            SELECT date, close FROM daily_bars
            WHERE symbol = $1 AND close IS NOT NULL
            ORDER BY date ASC
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
