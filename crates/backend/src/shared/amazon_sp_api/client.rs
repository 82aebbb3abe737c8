use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::time::{Duration, Instant};

use super::auth::SpApiAuth;
use super::credentials;
use super::rate_limiter::{QueueStatus, RateLimiter, REQUEST_QUEUE};
use super::types::{
    report_type, AmazonCredentials, CreateReportRequest, CreateReportResponse, Marketplace,
    ReportDocument, ReportProcessingStatus, ReportStatus, SpApiError,
};

const REPORTS_VERSION: &str = "2021-06-30";
const POLL_INTERVAL: Duration = Duration::from_secs(10);
const MAX_POLL_SECS: u64 = 600;

/// Regional SP-API endpoint
pub fn endpoint_for_region(region: &str) -> &'static str {
    match region {
        "eu-west-1" => "https://sellingpartnerapi-eu.amazon.com",
        "us-west-2" => "https://sellingpartnerapi-fe.amazon.com",
        _ => "https://sellingpartnerapi-na.amazon.com",
    }
}

/// Tab-separated report body with a header row into one map per line
pub fn parse_report_rows(content: &str) -> Result<Vec<HashMap<String, String>>, SpApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SpApiError::new("REPORT_PARSE_FAILED", e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SpApiError::new("REPORT_PARSE_FAILED", e.to_string()))?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), record.get(i).unwrap_or("").trim().to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[derive(Clone)]
pub struct SpApiClient {
    http: reqwest::Client,
    auth: SpApiAuth,
    limiter: RateLimiter,
    base_url: String,
}

impl SpApiClient {
    pub fn new(credentials: AmazonCredentials) -> Result<Self, SpApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SpApiError::new("HTTP_CLIENT_ERROR", e.to_string()))?;

        let base_url = crate::shared::config::get()
            .amazon
            .endpoint
            .clone()
            .unwrap_or_else(|| endpoint_for_region(&credentials.region).to_string());

        Ok(Self {
            auth: SpApiAuth::new(credentials, http.clone()),
            http,
            limiter: RateLimiter::default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self, SpApiError> {
        Self::new(credentials::from_env()?)
    }

    pub fn queue_status() -> QueueStatus {
        REQUEST_QUEUE.status()
    }

    fn host(&self) -> &str {
        self.base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
    }

    /// One signed request through the shared queue. Non-2xx answers become
    /// `{error_code}` errors carrying the status and the response body.
    pub(super) async fn send_signed(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &BTreeMap<String, String>,
        body: Option<String>,
        error_code: &str,
        failure: &str,
    ) -> Result<reqwest::Response, SpApiError> {
        let payload = body.clone().unwrap_or_default();
        let headers = self
            .auth
            .signed_headers(method.as_str(), path, self.host(), query, &payload)
            .await?;

        let query_string = super::auth::canonical_query_string(query);
        let url = if query_string.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query_string)
        };

        let mut request = self.http.request(method, &url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = REQUEST_QUEUE
            .run(request.send())
            .await
            .map_err(|e| SpApiError::transport(failure, &e))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                super::auth::clear_cache().await;
            }
            let text = response.text().await.unwrap_or_default();
            return Err(SpApiError::new(
                error_code,
                format!("{}: {}", failure, status.as_u16()),
            )
            .with_status(status.as_u16())
            .with_details(text));
        }
        Ok(response)
    }

    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: BTreeMap<String, String>,
        error_code: &str,
        failure: &str,
    ) -> Result<T, SpApiError> {
        self.limiter
            .execute_with_retry(operation, || async {
                let response = self
                    .send_signed(reqwest::Method::GET, path, &query, None, error_code, failure)
                    .await?;
                response
                    .json::<T>()
                    .await
                    .map_err(|e| SpApiError::new(error_code, format!("{}: {}", failure, e)))
            })
            .await
    }

    pub async fn request_report(
        &self,
        report_type: &str,
        marketplace_ids: &[String],
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        let marketplace_ids = if marketplace_ids.is_empty() {
            vec![Marketplace::Us.id().to_string()]
        } else {
            marketplace_ids.to_vec()
        };
        let payload = CreateReportRequest {
            report_type: report_type.to_string(),
            marketplace_ids,
            data_start_time: start.map(str::to_string),
            data_end_time: end.map(str::to_string),
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| SpApiError::new("REPORT_REQUEST_FAILED", e.to_string()))?;
        let path = format!("/reports/{}/reports", REPORTS_VERSION);

        let created: CreateReportResponse = self
            .limiter
            .execute_with_retry("request report", || async {
                let response = self
                    .send_signed(
                        reqwest::Method::POST,
                        &path,
                        &BTreeMap::new(),
                        Some(body.clone()),
                        "REPORT_REQUEST_FAILED",
                        "Failed to request report",
                    )
                    .await?;
                response.json::<CreateReportResponse>().await.map_err(|e| {
                    SpApiError::new("REPORT_REQUEST_FAILED", format!("Failed to request report: {}", e))
                })
            })
            .await?;

        tracing::info!("SP-API report {} requested: {}", report_type, created.report_id);
        Ok(created.report_id)
    }

    pub async fn get_report_status(&self, report_id: &str) -> Result<ReportStatus, SpApiError> {
        let path = format!("/reports/{}/reports/{}", REPORTS_VERSION, report_id);
        self.get_json(
            "get report status",
            &path,
            BTreeMap::new(),
            "GET_REPORT_FAILED",
            "Failed to get report status",
        )
        .await
    }

    /// Polls until the report is DONE and returns its document id
    pub async fn wait_for_report(&self, report_id: &str) -> Result<String, SpApiError> {
        let started = Instant::now();
        while started.elapsed() < Duration::from_secs(MAX_POLL_SECS) {
            let report = self.get_report_status(report_id).await?;
            match report.processing_status {
                ReportProcessingStatus::Done => {
                    return report.report_document_id.ok_or_else(|| {
                        SpApiError::new(
                            "REPORT_NO_DOCUMENT_ID",
                            "Report completed but no document ID returned",
                        )
                    });
                }
                ReportProcessingStatus::Cancelled | ReportProcessingStatus::Fatal => {
                    return Err(SpApiError::new(
                        "REPORT_PROCESSING_FAILED",
                        format!(
                            "Report processing failed with status: {:?}",
                            report.processing_status
                        ),
                    ));
                }
                ReportProcessingStatus::InProgress | ReportProcessingStatus::InQueue => {
                    tracing::debug!("Report {} still processing", report_id);
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
        Err(SpApiError::new(
            "REPORT_TIMEOUT",
            format!(
                "Report {} did not complete within {} seconds",
                report_id, MAX_POLL_SECS
            ),
        ))
    }

    pub async fn download_report(&self, document_id: &str) -> Result<String, SpApiError> {
        let path = format!("/reports/{}/documents/{}", REPORTS_VERSION, document_id);
        let document: ReportDocument = self
            .get_json(
                "get report document",
                &path,
                BTreeMap::new(),
                "GET_REPORT_DOCUMENT_FAILED",
                "Failed to get report document info",
            )
            .await?;

        self.limiter
            .execute_with_retry("download report", || async {
                let response = self
                    .http
                    .get(&document.url)
                    .send()
                    .await
                    .map_err(|e| SpApiError::transport("Failed to download report", &e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SpApiError::new(
                        "DOWNLOAD_REPORT_FAILED",
                        format!("Failed to download report: {}", status.as_u16()),
                    )
                    .with_status(status.as_u16()));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| SpApiError::transport("Failed to download report", &e))?;
                decode_document(&bytes, document.compression_algorithm.as_deref())
            })
            .await
    }

    /// request -> wait -> download
    pub async fn get_report(
        &self,
        report_type: &str,
        marketplace_ids: &[String],
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        let started = Instant::now();
        let report_id = self
            .request_report(report_type, marketplace_ids, start, end)
            .await?;
        let document_id = self.wait_for_report(&report_id).await?;
        let content = self.download_report(&document_id).await?;
        tracing::info!(
            "Report {} downloaded in {:.1}s ({} bytes)",
            report_type,
            started.elapsed().as_secs_f64(),
            content.len()
        );
        Ok(content)
    }

    pub async fn get_settlement_report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        self.get_report(report_type::SETTLEMENT_V2, &[], start, end).await
    }

    pub async fn get_orders_report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        self.get_report(report_type::FLAT_FILE_ORDERS, &[], start, end).await
    }

    pub async fn get_inventory_report(&self) -> Result<String, SpApiError> {
        self.get_report(report_type::FBA_INVENTORY, &[], None, None).await
    }

    pub async fn get_returns_report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        self.get_report(report_type::FBA_RETURNS, &[], start, end).await
    }

    pub async fn get_custom_report(
        &self,
        report_type: &str,
        marketplace_ids: &[String],
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, SpApiError> {
        self.get_report(report_type, marketplace_ids, start, end).await
    }

    pub async fn get_inventory_summaries(
        &self,
        marketplace_id: &str,
        details: bool,
        start_date_time: Option<&str>,
    ) -> Result<serde_json::Value, SpApiError> {
        let mut query = BTreeMap::new();
        query.insert("granularityType".to_string(), "Marketplace".to_string());
        query.insert("granularityId".to_string(), marketplace_id.to_string());
        query.insert("marketplaceIds".to_string(), marketplace_id.to_string());
        query.insert("details".to_string(), details.to_string());
        if let Some(start) = start_date_time {
            query.insert("startDateTime".to_string(), start.to_string());
        }
        self.get_json(
            "get inventory summaries",
            "/fba/inventory/v1/summaries",
            query,
            "GET_INVENTORY_SUMMARIES_FAILED",
            "Failed to get inventory summaries",
        )
        .await
    }

    pub async fn get_inbound_shipments(
        &self,
        statuses: &[String],
        updated_after: Option<&str>,
        updated_before: Option<&str>,
    ) -> Result<serde_json::Value, SpApiError> {
        let mut query = BTreeMap::new();
        if !statuses.is_empty() {
            query.insert("ShipmentStatusList".to_string(), statuses.join(","));
        }
        if let Some(after) = updated_after {
            query.insert("LastUpdatedAfter".to_string(), after.to_string());
        }
        if let Some(before) = updated_before {
            query.insert("LastUpdatedBefore".to_string(), before.to_string());
        }
        query.insert("MarketplaceId".to_string(), Marketplace::Us.id().to_string());
        self.get_json(
            "get inbound shipments",
            "/fba/inbound/v0/shipments",
            query,
            "GET_INBOUND_SHIPMENTS_FAILED",
            "Failed to get inbound shipments",
        )
        .await
    }

    /// Items of one shipment, or of every shipment updated in a date range
    /// (last 30 days when no range is given)
    pub async fn get_inbound_shipment_items(
        &self,
        shipment_id: Option<&str>,
        updated_after: Option<&str>,
        updated_before: Option<&str>,
    ) -> Result<serde_json::Value, SpApiError> {
        let mut query = BTreeMap::new();
        match (shipment_id, updated_after, updated_before) {
            (Some(id), _, _) => {
                query.insert("QueryType".to_string(), "SHIPMENT".to_string());
                query.insert("ShipmentId".to_string(), id.to_string());
            }
            (None, Some(after), Some(before)) => {
                query.insert("QueryType".to_string(), "DATE_RANGE".to_string());
                query.insert("LastUpdatedAfter".to_string(), after.to_string());
                query.insert("LastUpdatedBefore".to_string(), before.to_string());
            }
            _ => {
                let now = Utc::now();
                let from = now - ChronoDuration::days(30);
                query.insert("QueryType".to_string(), "DATE_RANGE".to_string());
                query.insert(
                    "LastUpdatedAfter".to_string(),
                    from.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
                query.insert(
                    "LastUpdatedBefore".to_string(),
                    now.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
        }
        query.insert("MarketplaceId".to_string(), Marketplace::Us.id().to_string());
        self.get_json(
            "get inbound shipment items",
            "/fba/inbound/v0/shipmentItems",
            query,
            "GET_INBOUND_SHIPMENT_ITEMS_FAILED",
            "Failed to get inbound shipment items",
        )
        .await
    }
}

fn decode_document(bytes: &[u8], compression: Option<&str>) -> Result<String, SpApiError> {
    if compression.map(|c| c.eq_ignore_ascii_case("GZIP")).unwrap_or(false) {
        let mut decoder = GzDecoder::new(bytes);
        let mut content = String::new();
        decoder.read_to_string(&mut content).map_err(|e| {
            SpApiError::new("DOWNLOAD_REPORT_FAILED", format!("Failed to decompress report: {}", e))
        })?;
        Ok(content)
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn endpoint_follows_region() {
        assert_eq!(
            endpoint_for_region("us-east-1"),
            "https://sellingpartnerapi-na.amazon.com"
        );
        assert_eq!(
            endpoint_for_region("eu-west-1"),
            "https://sellingpartnerapi-eu.amazon.com"
        );
        assert_eq!(
            endpoint_for_region("us-west-2"),
            "https://sellingpartnerapi-fe.amazon.com"
        );
    }

    #[test]
    fn parses_tab_separated_report() {
        let content = "sku\tasin\tquantity\nMNQ15-30W-US\tB0ABC\t12\nMG8702\tB0DEF\t\n";
        let rows = parse_report_rows(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["sku"], "MNQ15-30W-US");
        assert_eq!(rows[0]["quantity"], "12");
        assert_eq!(rows[1]["quantity"], "");
    }

    #[test]
    fn gunzips_compressed_documents() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"settlement-id\ttotal\n1\t9.99\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let text = decode_document(&compressed, Some("GZIP")).unwrap();
        assert!(text.starts_with("settlement-id"));

        let plain = decode_document(b"a\tb\n", None).unwrap();
        assert_eq!(plain, "a\tb\n");
    }
}
