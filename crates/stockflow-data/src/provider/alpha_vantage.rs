//! Alpha Vantage 시세 수집기.
//!
//! REST API에서 일봉/월봉 시계열을 조회하고 `DailyBar` 시퀀스로 정규화합니다.
//! 무료 플랜 기준 하루 25회, 분당 5회 호출 제한이 있으므로 호출 페이싱은
//! 수집 루프 쪽에서 담당합니다.
//!
//! # 에러 구분
//!
//! - HTTP/전송 실패와 JSON 파싱 실패는 `Transport`
//! - 2xx 응답이지만 시계열 키가 없으면 `MissingSeries`
//! - 2xx 응답에 rate limit 안내문이 들어있으면 `RateLimited`
//! - 날짜별 엔트리의 숫자 변환 실패는 `MalformedRecord`

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use stockflow_core::DailyBar;

/// 프로바이더 에러.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/HTTP 실패 또는 JSON 본문 파싱 실패
    #[error("전송 에러: {0}")]
    Transport(#[from] reqwest::Error),

    /// 응답에 기대한 시계열 키가 없음
    #[error("시계열 없음: {symbol} (키: {key})")]
    MissingSeries { symbol: String, key: &'static str },

    /// 호출 한도 초과 안내 응답
    #[error("Rate limit 초과: {symbol}")]
    RateLimited { symbol: String },

    /// 날짜별 엔트리를 숫자 타입으로 변환 실패
    #[error("레코드 손상: {symbol} {date} ({reason})")]
    MalformedRecord {
        symbol: String,
        date: String,
        reason: String,
    },
}

/// 조회할 시계열 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesKind {
    /// 일봉
    #[default]
    Daily,
    /// 월봉
    Monthly,
}

impl SeriesKind {
    /// API function 파라미터 값.
    pub fn function(&self) -> &'static str {
        match self {
            SeriesKind::Daily => "TIME_SERIES_DAILY",
            SeriesKind::Monthly => "TIME_SERIES_MONTHLY",
        }
    }

    /// 응답 페이로드의 시계열 키.
    pub fn series_key(&self) -> &'static str {
        match self {
            SeriesKind::Daily => "Time Series (Daily)",
            SeriesKind::Monthly => "Monthly Time Series",
        }
    }
}

/// 시계열 조회 collaborator.
///
/// 수집 루프는 이 트레이트를 통해서만 외부 API를 호출합니다.
#[async_trait]
pub trait BarSeriesProvider: Send + Sync {
    /// 원본 JSON 페이로드 조회. 비정상 상태코드와 본문 파싱 실패는 에러.
    async fn fetch_series(&self, symbol: &str, kind: SeriesKind) -> Result<Value, ProviderError>;
}

/// Alpha Vantage HTTP 클라이언트.
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    /// 새 클라이언트 생성.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl BarSeriesProvider for AlphaVantageClient {
    async fn fetch_series(&self, symbol: &str, kind: SeriesKind) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", kind.function()),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
                ("datatype", "json"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        debug!(symbol = symbol, function = kind.function(), "시계열 조회 완료");
        Ok(payload)
    }
}

/// 프로바이더 페이로드를 날짜 오름차순 `DailyBar` 시퀀스로 정규화.
///
/// 시계열은 날짜를 키로 하는 JSON 맵이라 순회 순서가 보장되지 않으므로
/// 반환 전에 명시적으로 정렬합니다.
pub fn normalize(
    symbol: &str,
    kind: SeriesKind,
    payload: &Value,
) -> Result<Vec<DailyBar>, ProviderError> {
    let key = kind.series_key();
    let series = match payload.get(key).and_then(Value::as_object) {
        Some(s) => s,
        None => {
            // 한도 초과 시에도 200 OK에 안내문만 담겨 옴
            if payload.get("Note").is_some() || payload.get("Information").is_some() {
                return Err(ProviderError::RateLimited {
                    symbol: symbol.to_string(),
                });
            }
            return Err(ProviderError::MissingSeries {
                symbol: symbol.to_string(),
                key,
            });
        }
    };

    let mut bars = Vec::with_capacity(series.len());
    for (date_str, fields) in series {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            ProviderError::MalformedRecord {
                symbol: symbol.to_string(),
                date: date_str.clone(),
                reason: format!("날짜 파싱 실패: {e}"),
            }
        })?;

        let bar = DailyBar {
            date,
            symbol: symbol.to_string(),
            open: field_decimal(symbol, date_str, fields, "1. open")?,
            high: field_decimal(symbol, date_str, fields, "2. high")?,
            low: field_decimal(symbol, date_str, fields, "3. low")?,
            close: field_decimal(symbol, date_str, fields, "4. close")?,
            volume: field_volume(symbol, date_str, fields, "5. volume")?,
        };
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// 가격 필드 추출 (문자열 → Decimal).
fn field_decimal(
    symbol: &str,
    date: &str,
    fields: &Value,
    name: &str,
) -> Result<Decimal, ProviderError> {
    let raw = fields.get(name).and_then(Value::as_str).ok_or_else(|| {
        ProviderError::MalformedRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            reason: format!("필드 없음: {name}"),
        }
    })?;

    raw.parse::<Decimal>()
        .map_err(|e| ProviderError::MalformedRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            reason: format!("{name} 숫자 변환 실패: {e}"),
        })
}

/// 거래량 필드 추출 (음수 거부).
fn field_volume(
    symbol: &str,
    date: &str,
    fields: &Value,
    name: &str,
) -> Result<i64, ProviderError> {
    let raw = fields.get(name).and_then(Value::as_str).ok_or_else(|| {
        ProviderError::MalformedRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            reason: format!("필드 없음: {name}"),
        }
    })?;

    let volume = raw
        .parse::<i64>()
        .map_err(|e| ProviderError::MalformedRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            reason: format!("{name} 정수 변환 실패: {e}"),
        })?;

    if volume < 0 {
        return Err(ProviderError::MalformedRecord {
            symbol: symbol.to_string(),
            date: date.to_string(),
            reason: format!("{name} 음수 거래량: {volume}"),
        });
    }

    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(open: &str, high: &str, low: &str, close: &str, volume: &str) -> Value {
        json!({
            "1. open": open,
            "2. high": high,
            "3. low": low,
            "4. close": close,
            "5. volume": volume,
        })
    }

    #[test]
    fn test_normalize_sorts_ascending() {
        // JSON 맵 순회 순서와 무관하게 날짜 오름차순이어야 함
        let payload = json!({
            "Time Series (Daily)": {
                "2024-03-04": entry("12", "13", "11", "12.5", "300"),
                "2024-03-01": entry("10", "11", "9", "10.5", "100"),
                "2024-03-05": entry("13", "14", "12", "13.5", "400"),
                "2024-02-29": entry("9", "10", "8", "9.5", "50"),
            }
        });

        let bars = normalize("NVDA", SeriesKind::Daily, &payload).unwrap();
        assert_eq!(bars.len(), 4);
        for pair in bars.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(bars[0].symbol, "NVDA");
        assert_eq!(bars[3].volume, 400);
    }

    #[test]
    fn test_normalize_missing_series() {
        let payload = json!({ "Meta Data": { "2. Symbol": "AMD" } });
        let err = normalize("AMD", SeriesKind::Daily, &payload).unwrap_err();
        assert!(matches!(err, ProviderError::MissingSeries { .. }));
    }

    #[test]
    fn test_normalize_rate_limit_note() {
        let payload = json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
        });
        let err = normalize("AMD", SeriesKind::Daily, &payload).unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[test]
    fn test_normalize_malformed_price() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-03-01": entry("not-a-number", "11", "9", "10.5", "100"),
            }
        });
        let err = normalize("NVDA", SeriesKind::Daily, &payload).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRecord { .. }));
    }

    #[test]
    fn test_normalize_negative_volume() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-03-01": entry("10", "11", "9", "10.5", "-100"),
            }
        });
        let err = normalize("NVDA", SeriesKind::Daily, &payload).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRecord { .. }));
    }

    #[test]
    fn test_normalize_monthly_key() {
        let payload = json!({
            "Monthly Time Series": {
                "2024-02-29": entry("9", "10", "8", "9.5", "50"),
            }
        });
        let bars = normalize("NVDA", SeriesKind::Monthly, &payload).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_series_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "Time Series (Daily)": {
                "2024-03-01": entry("10", "11", "9", "10.5", "100"),
            }
        });
        let mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("function".into(), "TIME_SERIES_DAILY".into()),
                mockito::Matcher::UrlEncoded("symbol".into(), "NVDA".into()),
                mockito::Matcher::UrlEncoded("apikey".into(), "demo".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = AlphaVantageClient::new(server.url(), "demo").unwrap();
        let payload = client.fetch_series("NVDA", SeriesKind::Daily).await.unwrap();
        let bars = normalize("NVDA", SeriesKind::Daily, &payload).unwrap();

        mock.assert_async().await;
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, "10.5".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_fetch_series_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = AlphaVantageClient::new(server.url(), "demo").unwrap();
        let err = client.fetch_series("NVDA", SeriesKind::Daily).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
