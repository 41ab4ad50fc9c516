use crate::errors::{EngineError, EngineResult};
use crate::models::yield_curve::YieldCurveTable;
use chrono::Datelike;
use reqwest::Client;

/// US Treasury daily par yield curve feed (CSV download of the same table
/// published on the rates page).
#[derive(Clone)]
pub struct TreasuryCurveClient {
    client: Client,
    base_url: String,
}

impl TreasuryCurveClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Latest published curve, maturities in years and rates as fractions.
    pub async fn fetch_curve(&self) -> EngineResult<YieldCurveTable> {
        let year = chrono::Utc::now().year();
        let url = format!(
            "{}/{year}/all?type=daily_treasury_yield_curve&field_tdr_date_value={year}&page&_format=csv",
            self.base_url
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::CurveFetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::CurveFetch(format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| EngineError::CurveFetch(format!("body: {e}")))?;

        parse_curve_csv(&body)
    }
}

/// Tenor label such as `1 Mo`, `1.5 Month`, `2 Yr` to a maturity in years.
fn tenor_years(label: &str) -> Option<f64> {
    let mut parts = label.split_whitespace();
    let amount: f64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?.to_ascii_lowercase();
    let months = if unit.starts_with("mo") {
        amount
    } else if unit.starts_with("yr") || unit.starts_with("year") {
        amount * 12.0
    } else if unit.starts_with("wk") || unit.starts_with("week") {
        amount * 12.0 / 52.0
    } else {
        return None;
    };
    Some(months / 12.0)
}

/// Parse the daily yield curve CSV. The first data row is the most recent
/// date; blank cells (tenors not quoted that day) are skipped.
pub fn parse_curve_csv(text: &str) -> EngineResult<YieldCurveTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| EngineError::CurveFetch(format!("curve CSV header: {e}")))?;
    if header.is_empty() {
        return Err(EngineError::CurveFetch("empty curve CSV".into()));
    }
    let tenors: Vec<Option<f64>> = header.iter().skip(1).map(tenor_years).collect();

    let latest = reader
        .records()
        .next()
        .ok_or_else(|| EngineError::CurveFetch("curve CSV has no data rows".into()))?
        .map_err(|e| EngineError::CurveFetch(format!("curve CSV row: {e}")))?;
    let date = latest.get(0).unwrap_or_default();

    let mut table: YieldCurveTable = Vec::with_capacity(tenors.len());
    for (tenor, cell) in tenors.iter().zip(latest.iter().skip(1)) {
        let Some(t) = *tenor else { continue };
        if cell.is_empty() {
            continue;
        }
        let pct: f64 = cell
            .parse()
            .map_err(|_| EngineError::CurveFetch(format!("bad rate cell {cell:?}")))?;
        table.push((t, pct / 100.0));
    }
    table.sort_by(|a, b| a.0.total_cmp(&b.0));

    tracing::debug!(date = %date, points = table.len(), "treasury curve parsed");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Date,\"1 Mo\",\"1.5 Month\",\"2 Mo\",\"3 Mo\",\"4 Mo\",\"6 Mo\",\"1 Yr\",\"2 Yr\",\"3 Yr\",\"5 Yr\",\"7 Yr\",\"10 Yr\",\"20 Yr\",\"30 Yr\"
10/17/2025,4.24,4.18,4.12,4.04,3.98,3.80,3.58,3.46,3.47,3.59,3.79,4.01,4.59,4.60
10/16/2025,4.25,4.20,4.13,4.05,3.99,3.82,3.60,3.42,3.44,3.56,3.76,3.99,4.56,4.58
";

    #[test]
    fn test_tenor_labels() {
        assert!((tenor_years("1 Mo").unwrap() - 1.0 / 12.0).abs() < 1e-12);
        assert!((tenor_years("1.5 Month").unwrap() - 0.125).abs() < 1e-12);
        assert_eq!(tenor_years("30 Yr"), Some(30.0));
        assert!(tenor_years("Date").is_none());
    }

    #[test]
    fn test_parses_latest_row_and_converts_units() {
        let table = parse_curve_csv(CSV).unwrap();
        assert_eq!(table.len(), 14);
        assert!((table[0].0 - 1.0 / 12.0).abs() < 1e-12);
        assert!((table[0].1 - 0.0424).abs() < 1e-12);
        assert_eq!(table[13].0, 30.0);
        assert!((table[13].1 - 0.0460).abs() < 1e-12);
        assert!(table.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_blank_cells_skipped() {
        let csv = "Date,\"1 Mo\",\"2 Mo\",\"3 Mo\"\n01/02/2024,5.55,,5.48\n";
        let table = parse_curve_csv(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].0, 0.25);
    }

    #[test]
    fn test_missing_rows_fail() {
        assert!(matches!(parse_curve_csv(""), Err(EngineError::CurveFetch(_))));
        assert!(matches!(
            parse_curve_csv("Date,\"1 Mo\"\n"),
            Err(EngineError::CurveFetch(_))
        ));
        assert!(matches!(
            parse_curve_csv("Date,\"1 Mo\"\n01/02/2024,abc\n"),
            Err(EngineError::CurveFetch(_))
        ));
    }

    #[test]
    fn test_quoted_date_with_comma() {
        let csv = "\"Date\",\"1 Mo\",\"3 Mo\"\n\"Oct 17, 2025\",4.24,4.04\n";
        let table = parse_curve_csv(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert!((table[0].0 - 1.0 / 12.0).abs() < 1e-12);
        assert!((table[0].1 - 0.0424).abs() < 1e-12);
        assert_eq!(table[1].0, 0.25);
        assert!((table[1].1 - 0.0404).abs() < 1e-12);
    }
}
