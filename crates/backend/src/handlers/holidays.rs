use axum::{extract::Query, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::shared::errors::{ServiceError, ServiceResult};
use crate::shared::holidays;

#[derive(Debug, Default, Deserialize)]
pub struct HolidayQuery {
    pub year: Option<i32>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_date(value: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::bad_request(format!("Invalid date: {}", value)))
}

/// GET /api/holidays/chinese/periods
///
/// `?date=` classifies one day, `?start=&end=` a range, otherwise the
/// periods of `?year=` (default current year).
pub async fn chinese_periods(
    Query(query): Query<HolidayQuery>,
) -> ServiceResult<Json<serde_json::Value>> {
    if let Some(date) = query.date.as_deref() {
        let classification = holidays::classify(parse_date(date)?);
        let caution = classification.caution();
        return Ok(Json(json!({
            "success": true,
            "date": date,
            "classification": classification,
            "shipmentCaution": {
                "isCaution": caution.is_some(),
                "reason": caution,
                "holidayName": classification.holiday_name,
            },
        })));
    }

    if let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) {
        let classifications = holidays::classify_range(parse_date(start)?, parse_date(end)?)
            .map_err(ServiceError::bad_request)?;
        return Ok(Json(json!({
            "success": true,
            "startDate": start,
            "endDate": end,
            "count": classifications.len(),
            "classifications": classifications,
        })));
    }

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let periods = holidays::periods_for(year);
    Ok(Json(json!({
        "success": true,
        "year": year,
        "count": periods.len(),
        "holidayPeriods": periods,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_date_reports_caution() {
        let Json(body) = chinese_periods(Query(HolidayQuery {
            date: Some("2025-01-26".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
        assert_eq!(body["classification"]["type"], "soft-holiday");
        assert_eq!(body["shipmentCaution"]["isCaution"], true);
        assert_eq!(
            body["shipmentCaution"]["reason"],
            "2 days before Spring Festival (Chinese New Year)"
        );
    }

    #[tokio::test]
    async fn bad_dates_are_rejected() {
        let result = chinese_periods(Query(HolidayQuery {
            start: Some("2025-02-01".into()),
            end: Some("tomorrow".into()),
            ..Default::default()
        }))
        .await;
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
