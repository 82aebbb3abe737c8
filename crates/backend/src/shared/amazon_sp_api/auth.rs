use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::types::{AmazonCredentials, SpApiError};

const LWA_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";
/// Tokens are refreshed this long before Amazon says they expire
const TOKEN_BUFFER_SECS: u64 = 300;
const DEFAULT_EXPIRES_IN: u64 = 3600;

const SERVICE: &str = "execute-api";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-date";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct LwaTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    client_id: String,
    access_token: String,
    expires_at: Instant,
}

static TOKEN_CACHE: Lazy<Mutex<Option<CachedToken>>> = Lazy::new(|| Mutex::new(None));

/// Headers to attach to a signed SP-API request
pub type SignedHeaders = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct SpApiAuth {
    credentials: AmazonCredentials,
    http: reqwest::Client,
    signer: SigV4Signer,
}

impl SpApiAuth {
    pub fn new(credentials: AmazonCredentials, http: reqwest::Client) -> Self {
        let signer = SigV4Signer::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            credentials.region.clone(),
        );
        Self {
            credentials,
            http,
            signer,
        }
    }

    /// Returns a cached LWA access token or exchanges the refresh token for a new one
    pub async fn access_token(&self) -> Result<String, SpApiError> {
        let mut cache = TOKEN_CACHE.lock().await;
        if let Some(token) = cache.as_ref() {
            if token.client_id == self.credentials.client_id && Instant::now() < token.expires_at {
                tracing::debug!("Using cached LWA token");
                return Ok(token.access_token.clone());
            }
        }

        tracing::info!("Requesting new LWA token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(LWA_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                SpApiError::new(
                    "LWA_TOKEN_REQUEST_FAILED",
                    format!("Failed to request LWA token: {}", e),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpApiError::new(
                "LWA_TOKEN_ERROR",
                format!("Failed to obtain LWA token: {}", status.as_u16()),
            )
            .with_status(status.as_u16())
            .with_details(body));
        }

        let data: LwaTokenResponse = response.json().await.map_err(|e| {
            SpApiError::new(
                "LWA_TOKEN_REQUEST_FAILED",
                format!("Failed to request LWA token: {}", e),
            )
        })?;
        let expires_in = data.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        let lifetime = expires_in.saturating_sub(TOKEN_BUFFER_SECS);
        *cache = Some(CachedToken {
            client_id: self.credentials.client_id.clone(),
            access_token: data.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        tracing::info!("New LWA token obtained, expires in {} s", expires_in);
        Ok(data.access_token)
    }

    pub async fn signed_headers(
        &self,
        method: &str,
        path: &str,
        host: &str,
        query: &BTreeMap<String, String>,
        payload: &str,
    ) -> Result<SignedHeaders, SpApiError> {
        let token = self.access_token().await?;
        Ok(self
            .signer
            .sign_at(method, path, host, query, payload, &token, Utc::now()))
    }
}

/// Forgets the cached LWA token so the next call exchanges the refresh token again
pub async fn clear_cache() {
    *TOKEN_CACHE.lock().await = None;
}

#[derive(Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl SigV4Signer {
    pub fn new(access_key: String, secret_key: String, region: String) -> Self {
        Self {
            access_key,
            secret_key,
            region,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sign_at(
        &self,
        method: &str,
        path: &str,
        host: &str,
        query: &BTreeMap<String, String>,
        payload: &str,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let canonical_request = [
            method.to_string(),
            path.to_string(),
            canonical_query_string(query),
            format!("host:{}\nx-amz-date:{}\n", host, amz_date),
            SIGNED_HEADERS.to_string(),
            sha256_hex(payload.as_bytes()),
        ]
        .join("\n");

        let scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, SERVICE);
        let string_to_sign = [
            ALGORITHM.to_string(),
            amz_date.clone(),
            scope.clone(),
            sha256_hex(canonical_request.as_bytes()),
        ]
        .join("\n");

        let key = derive_signing_key(&self.secret_key, &date_stamp, &self.region, SERVICE);
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, scope, SIGNED_HEADERS, signature
        );

        vec![
            ("Authorization", authorization),
            ("x-amz-access-token", access_token.to_string()),
            ("x-amz-date", amz_date),
            ("Content-Type", "application/json".to_string()),
        ]
    }
}

/// Sorted `key=value` pairs, both sides RFC 3986 encoded
pub fn canonical_query_string(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// kDate -> kRegion -> kService -> kSigning
pub fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signing_key_matches_aws_reference() {
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn canonical_query_is_sorted_and_encoded() {
        let mut query = BTreeMap::new();
        query.insert("PostedBefore".to_string(), "2024-01-31T23:59:59Z".to_string());
        query.insert("NextToken".to_string(), "a b/c+d".to_string());
        query.insert("MaxResultsPerPage".to_string(), "100".to_string());
        assert_eq!(
            canonical_query_string(&query),
            "MaxResultsPerPage=100&NextToken=a%20b%2Fc%2Bd&PostedBefore=2024-01-31T23%3A59%3A59Z"
        );
        assert_eq!(canonical_query_string(&BTreeMap::new()), "");
    }

    #[test]
    fn signed_headers_carry_scope_and_token() {
        let signer = SigV4Signer::new("AKIDEXAMPLE".into(), "secret".into(), "us-east-1".into());
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap();
        let headers = signer.sign_at(
            "GET",
            "/reports/2021-06-30/reports/42",
            "sellingpartnerapi-na.amazon.com",
            &BTreeMap::new(),
            "",
            "Atza|token",
            now,
        );
        let get = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("x-amz-date"), "20240115T083000Z");
        assert_eq!(get("x-amz-access-token"), "Atza|token");
        let auth = get("Authorization");
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240115/us-east-1/execute-api/aws4_request, SignedHeaders=host;x-amz-date, Signature="
        ));
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);

        let again = signer.sign_at(
            "GET",
            "/reports/2021-06-30/reports/42",
            "sellingpartnerapi-na.amazon.com",
            &BTreeMap::new(),
            "",
            "Atza|token",
            now,
        );
        assert_eq!(headers, again);
    }
}
