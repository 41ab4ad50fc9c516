use crate::errors::{EngineError, EngineResult};
use crate::models::{Bar, PriceHistory};
use reqwest::{Client, StatusCode};

/// Yahoo Finance chart API client. Fetches daily bars for a ticker.
/// All methods return Result, never panic.
#[derive(Clone)]
pub struct MarketDataClient {
    client: Client,
    base_url: String,
    range: String,
}

impl MarketDataClient {
    pub fn new(base_url: &str, range: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent("Mozilla/5.0 (compatible; bopm-pricer)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            range: range.to_string(),
        }
    }

    /// Daily bars over the configured lookback range, oldest first.
    pub async fn fetch_history(&self, ticker: &str) -> EngineResult<PriceHistory> {
        let url = format!(
            "{}/{}?range={}&interval=1d",
            self.base_url, ticker, self.range
        );

        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(EngineError::UnknownTicker(ticker.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::MarketData(format!("HTTP {status}: {body}")));
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::MarketData(format!("parse: {e}")))?;

        let history = parse_chart(data, ticker)?;
        tracing::debug!(ticker = %ticker, bars = history.len(), "price history fetched");
        Ok(history)
    }
}

// Chart response format (trimmed):
// {
//   "chart": {
//     "result": [{
//       "timestamp": [1704205800, ...],
//       "indicators": { "quote": [{ "open": [187.15, ...], "close": [185.64, ...] }] }
//     }],
//     "error": null
//   }
// }

#[derive(Debug, serde::Deserialize)]
pub struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, serde::Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, serde::Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, serde::Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turn a chart payload into bars. Bars with a missing open or close are
/// dropped; a payload with no usable bars means the ticker is unknown.
pub fn parse_chart(data: ChartResponse, ticker: &str) -> EngineResult<PriceHistory> {
    if let Some(err) = data.chart.error {
        let code = err.code.unwrap_or_default();
        tracing::debug!(
            ticker = %ticker,
            code = %code,
            description = err.description.as_deref().unwrap_or(""),
            "chart error payload"
        );
        return Err(EngineError::UnknownTicker(ticker.to_string()));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| EngineError::UnknownTicker(ticker.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::UnknownTicker(ticker.to_string()))?;

    let bars: Vec<Bar> = timestamps
        .iter()
        .zip(quote.open.iter().zip(quote.close.iter()))
        .filter_map(|(&ts, (open, close))| {
            let date = chrono::DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(Bar {
                date,
                open: (*open)?,
                close: (*close)?,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(EngineError::UnknownTicker(ticker.to_string()));
    }

    Ok(PriceHistory::new(bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EngineResult<PriceHistory> {
        let data: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart(data, "TEST")
    }

    #[test]
    fn test_parses_bars_and_drops_nulls() {
        let h = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"TEST"},
                "timestamp":[1704205800,1704292200,1704378600],
                "indicators":{"quote":[{
                    "open":[187.15,null,182.15],
                    "close":[185.64,184.25,181.91],
                    "volume":[1,2,3]
                }]}
            }],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(h.len(), 2);
        assert_eq!(h.bars()[0].open, 187.15);
        assert_eq!(h.last_close(), Some(181.91));
        assert_eq!(
            h.bars()[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_error_payload_is_unknown_ticker() {
        let r = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        assert!(matches!(r, Err(EngineError::UnknownTicker(t)) if t == "TEST"));
    }

    #[test]
    fn test_empty_result_is_unknown_ticker() {
        let r = parse(r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#);
        assert!(matches!(r, Err(EngineError::UnknownTicker(_))));
    }
}
