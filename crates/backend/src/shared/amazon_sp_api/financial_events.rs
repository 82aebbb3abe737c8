use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use super::client::SpApiClient;
use super::types::{
    FinancialEventGroup, FinancialEventsPayload, FinancialEventsResponse, SpApiError,
};

const FINANCES_PATH: &str = "/finances/v0/financialEvents";
const PAGE_SIZE: &str = "100";
/// Amazon rejects PostedBefore values closer than two minutes to now
const TIME_BUFFER_MINUTES: i64 = 2;
pub const DEFAULT_CHUNK_DAYS: u32 = 30;

/// `{end}T23:59:59Z`, pulled back to now minus the buffer when that is too recent
pub fn posted_before(end: NaiveDate, now: DateTime<Utc>) -> String {
    let end_of_day = end
        .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
        .and_utc();
    let buffer = Duration::minutes(TIME_BUFFER_MINUTES);
    let bounded = if now - end_of_day < buffer {
        now - buffer
    } else {
        end_of_day
    };
    bounded.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A page without `payload` is an API contract failure, not an empty page
fn page_payload(response: FinancialEventsResponse) -> Result<FinancialEventsPayload, SpApiError> {
    response.payload.ok_or_else(|| {
        SpApiError::new(
            "FINANCIAL_EVENTS_FAILED",
            "Financial events response has no payload",
        )
    })
}

pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Splits `[start, end]` into windows of at most `chunk_days` days, both ends
/// inclusive; each window starts the day after the previous one ended.
pub fn chunk_ranges(start: NaiveDate, end: NaiveDate, chunk_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let step = Duration::days(i64::from(chunk_days.max(1)) - 1);
    let mut ranges = Vec::new();
    let mut current = start;
    while current <= end {
        let chunk_end = (current + step).min(end);
        ranges.push((current, chunk_end));
        current = chunk_end + Duration::days(1);
    }
    ranges
}

impl SpApiClient {
    /// All event groups posted in `[start, end]`, following NextToken pages
    pub async fn get_financial_transactions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FinancialEventGroup>, SpApiError> {
        let posted_after = format!("{}T00:00:00Z", start.format("%Y-%m-%d"));
        let posted_before = posted_before(end, Utc::now());

        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;
        let mut page = 0u32;
        loop {
            page += 1;
            let mut query = BTreeMap::new();
            query.insert("PostedAfter".to_string(), posted_after.clone());
            query.insert("PostedBefore".to_string(), posted_before.clone());
            query.insert("MaxResultsPerPage".to_string(), PAGE_SIZE.to_string());
            if let Some(token) = &next_token {
                query.insert("NextToken".to_string(), token.clone());
            }

            let response: FinancialEventsResponse = self
                .get_json(
                    "fetch financial events",
                    FINANCES_PATH,
                    query,
                    "FINANCIAL_EVENTS_FAILED",
                    "Failed to fetch financial events",
                )
                .await?;

            let payload = page_payload(response)?;
            if let Some(events) = payload.financial_events {
                groups.push(events);
            }
            next_token = payload.next_token.filter(|t| !t.is_empty());
            if next_token.is_none() {
                break;
            }
            tracing::debug!("Financial events {}..{}: page {} has more", start, end, page);
        }

        tracing::info!(
            "Fetched {} financial event pages for {}..{}",
            page,
            start,
            end
        );
        Ok(groups)
    }

    pub async fn get_monthly_transactions(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<FinancialEventGroup>, SpApiError> {
        let (start, end) = month_range(year, month).ok_or_else(|| {
            SpApiError::new("INVALID_DATE_RANGE", format!("Invalid month: {}-{}", year, month))
        })?;
        self.get_financial_transactions(start, end).await
    }

    pub async fn get_current_month_transactions(
        &self,
    ) -> Result<Vec<FinancialEventGroup>, SpApiError> {
        let today = Utc::now().date_naive();
        let start = today.with_day(1).unwrap_or(today);
        self.get_financial_transactions(start, today).await
    }

    pub async fn get_financial_transactions_chunked(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        chunk_days: u32,
    ) -> Result<Vec<FinancialEventGroup>, SpApiError> {
        let mut groups = Vec::new();
        for (chunk_start, chunk_end) in chunk_ranges(start, end, chunk_days) {
            let mut chunk = self.get_financial_transactions(chunk_start, chunk_end).await?;
            groups.append(&mut chunk);
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn posted_before_uses_end_of_day_for_past_dates() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(posted_before(date(2024, 2, 29), now), "2024-02-29T23:59:59Z");
    }

    #[test]
    fn posted_before_is_buffered_for_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 30).unwrap();
        assert_eq!(posted_before(date(2024, 3, 10), now), "2024-03-10T11:58:30Z");
    }

    #[test]
    fn month_range_handles_leap_and_december() {
        assert_eq!(month_range(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_range(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_range(2023, 13), None);
    }

    #[test]
    fn chunks_start_the_day_after_previous_end() {
        let chunks = chunk_ranges(date(2024, 1, 1), date(2024, 3, 1), 30);
        assert_eq!(
            chunks,
            vec![
                (date(2024, 1, 1), date(2024, 1, 30)),
                (date(2024, 1, 31), date(2024, 2, 29)),
                (date(2024, 3, 1), date(2024, 3, 1)),
            ]
        );
        assert_eq!(
            chunk_ranges(date(2024, 1, 5), date(2024, 1, 5), 30),
            vec![(date(2024, 1, 5), date(2024, 1, 5))]
        );
        assert!(chunk_ranges(date(2024, 2, 1), date(2024, 1, 1), 30).is_empty());
    }

    #[test]
    fn windows_never_exceed_chunk_days() {
        let chunks = chunk_ranges(date(2025, 1, 1), date(2025, 12, 31), 180);
        assert_eq!(
            chunks,
            vec![
                (date(2025, 1, 1), date(2025, 6, 29)),
                (date(2025, 6, 30), date(2025, 12, 26)),
                (date(2025, 12, 27), date(2025, 12, 31)),
            ]
        );
        for (start, end) in &chunks {
            assert!((*end - *start).num_days() + 1 <= 180);
        }
        assert_eq!(
            chunk_ranges(date(2025, 1, 1), date(2025, 1, 3), 1),
            vec![
                (date(2025, 1, 1), date(2025, 1, 1)),
                (date(2025, 1, 2), date(2025, 1, 2)),
                (date(2025, 1, 3), date(2025, 1, 3)),
            ]
        );
    }

    #[test]
    fn lowercase_payload_page_is_read() {
        let response: FinancialEventsResponse = serde_json::from_str(
            r#"{"payload": {"NextToken": "n1", "FinancialEvents": {"ShipmentEventList": []}}}"#,
        )
        .unwrap();
        let payload = page_payload(response).unwrap();
        assert_eq!(payload.next_token.as_deref(), Some("n1"));
        assert!(payload.financial_events.is_some());
    }

    #[test]
    fn page_without_payload_is_an_error() {
        let response: FinancialEventsResponse =
            serde_json::from_str(r#"{"errors": [{"code": "InvalidInput"}]}"#).unwrap();
        let err = page_payload(response).unwrap_err();
        assert_eq!(err.code, "FINANCIAL_EVENTS_FAILED");
    }
}
