use axum::{extract::Query, http::StatusCode, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::shared::amazon_sp_api::financial_events::DEFAULT_CHUNK_DAYS;
use crate::shared::amazon_sp_api::{
    credentials, financial_parser, types::report_type, Marketplace, SpApiClient, SpApiError,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn sp_api_error(e: SpApiError) -> ApiError {
    tracing::error!("SP-API call failed: {}", e);
    let status = match e.code.as_str() {
        "CREDENTIALS_MISSING" => StatusCode::SERVICE_UNAVAILABLE,
        "INVALID_DATE_RANGE" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({"error": e.message, "code": e.code, "details": e.details})),
    )
}

fn client() -> Result<SpApiClient, ApiError> {
    SpApiClient::from_env().map_err(sp_api_error)
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message.into()})))
}

/// GET /api/amazon/config
pub async fn config_status() -> Json<serde_json::Value> {
    Json(json!({
        "config": credentials::config_status(),
        "queue": SpApiClient::queue_status(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// settlement, orders, inventory, returns, or a raw SP-API report type
    pub report_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub marketplaces: Vec<String>,
}

/// Known short names resolve to SP-API report types; anything else passes through
fn resolve_report_type(name: &str) -> &str {
    match name {
        "settlement" => report_type::SETTLEMENT_V2,
        "orders" => report_type::FLAT_FILE_ORDERS,
        "inventory" => report_type::FBA_INVENTORY,
        "returns" => report_type::FBA_RETURNS,
        other => other,
    }
}

fn marketplace_ids(codes: &[String]) -> Result<Vec<String>, ApiError> {
    codes
        .iter()
        .map(|code| {
            Marketplace::parse(code)
                .map(|m| m.id().to_string())
                .ok_or_else(|| bad_request(format!("Unknown marketplace: {}", code)))
        })
        .collect()
}

/// POST /api/amazon/reports
///
/// Requests a report, waits for it and returns the parsed rows.
pub async fn get_report(
    Json(request): Json<ReportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.report_type.trim().is_empty() {
        return Err(bad_request("report_type is required"));
    }
    let marketplaces = marketplace_ids(&request.marketplaces)?;
    let report = resolve_report_type(&request.report_type);

    let client = client()?;
    let (start, end) = (request.start_date.as_deref(), request.end_date.as_deref());

    // Short names without a marketplace filter use the default-marketplace wrappers
    let content = match (request.report_type.as_str(), marketplaces.is_empty()) {
        ("settlement", true) => client.get_settlement_report(start, end).await,
        ("orders", true) => client.get_orders_report(start, end).await,
        ("inventory", true) => client.get_inventory_report().await,
        ("returns", true) => client.get_returns_report(start, end).await,
        _ => {
            client
                .get_custom_report(report, &marketplaces, start, end)
                .await
        }
    }
    .map_err(sp_api_error)?;
    let rows = crate::shared::amazon_sp_api::client::parse_report_rows(&content)
        .map_err(sp_api_error)?;

    Ok(Json(json!({
        "success": true,
        "reportType": report,
        "rowCount": rows.len(),
        "rows": rows,
    })))
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub marketplace: Option<String>,
    #[serde(default)]
    pub details: bool,
    pub start_date_time: Option<String>,
}

/// GET /api/amazon/inventory
pub async fn inventory(
    Query(query): Query<InventoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let marketplace = match query.marketplace.as_deref() {
        Some(code) => {
            Marketplace::parse(code).ok_or_else(|| bad_request(format!("Unknown marketplace: {}", code)))?
        }
        None => Marketplace::Us,
    };
    client()?
        .get_inventory_summaries(
            marketplace.id(),
            query.details,
            query.start_date_time.as_deref(),
        )
        .await
        .map(Json)
        .map_err(sp_api_error)
}

#[derive(Debug, Deserialize)]
pub struct InboundQuery {
    /// Comma separated shipment statuses
    pub statuses: Option<String>,
    pub updated_after: Option<String>,
    pub updated_before: Option<String>,
    pub shipment_id: Option<String>,
}

/// GET /api/amazon/inbound-shipments
pub async fn inbound_shipments(
    Query(query): Query<InboundQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let statuses: Vec<String> = query
        .statuses
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    client()?
        .get_inbound_shipments(
            &statuses,
            query.updated_after.as_deref(),
            query.updated_before.as_deref(),
        )
        .await
        .map(Json)
        .map_err(sp_api_error)
}

/// GET /api/amazon/inbound-shipments/items
pub async fn inbound_shipment_items(
    Query(query): Query<InboundQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    client()?
        .get_inbound_shipment_items(
            query.shipment_id.as_deref(),
            query.updated_after.as_deref(),
            query.updated_before.as_deref(),
        )
        .await
        .map(Json)
        .map_err(sp_api_error)
}

#[derive(Debug, Deserialize)]
pub struct FinancialQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// GET /api/amazon/financial-summary
///
/// Date range, a calendar month, or the current month when neither is given.
pub async fn financial_summary(
    Query(query): Query<FinancialQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = client()?;
    let groups = match (query.start_date, query.end_date, query.year, query.month) {
        (Some(start), Some(end), _, _) => {
            if end < start {
                return Err(bad_request("end_date must not be before start_date"));
            }
            client
                .get_financial_transactions_chunked(start, end, DEFAULT_CHUNK_DAYS)
                .await
        }
        (_, _, Some(year), Some(month)) => client.get_monthly_transactions(year, month).await,
        (_, _, None, Some(month)) => {
            client
                .get_monthly_transactions(Utc::now().year(), month)
                .await
        }
        _ => client.get_current_month_transactions().await,
    }
    .map_err(sp_api_error)?;

    let summary = financial_parser::summarize(&groups);
    Ok(Json(json!({
        "success": true,
        "eventGroups": groups.len(),
        "netProceeds": summary.net_proceeds(),
        "summary": summary,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_report_names_resolve() {
        assert_eq!(
            resolve_report_type("settlement"),
            "GET_V2_SETTLEMENT_REPORT_DATA_FLAT_FILE_V2"
        );
        assert_eq!(
            resolve_report_type("GET_MERCHANT_LISTINGS_ALL_DATA"),
            "GET_MERCHANT_LISTINGS_ALL_DATA"
        );
    }

    #[test]
    fn marketplace_codes_map_to_ids() {
        let ids = marketplace_ids(&["US".into(), "ca".into()]).unwrap();
        assert_eq!(ids, vec!["ATVPDKIKX0DER".to_string(), "A2EUQ1WTGCTBG2".to_string()]);
        assert!(marketplace_ids(&["XX".into()]).is_err());
    }
}
