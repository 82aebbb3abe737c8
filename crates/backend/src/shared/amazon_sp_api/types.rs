use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by any SP-API call. `code` is a stable machine-readable tag
/// (either our own, e.g. `REPORT_TIMEOUT`, or Amazon's, e.g. `QuotaExceeded`).
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct SpApiError {
    pub code: String,
    pub message: String,
    pub status_code: Option<u16>,
    pub details: Option<String>,
}

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const TIMEOUT_ERROR: &str = "TIMEOUT";

impl SpApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Failure before any HTTP status was received
    pub fn transport(context: &str, err: &reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            TIMEOUT_ERROR
        } else {
            NETWORK_ERROR
        };
        Self::new(code, format!("{}: {}", context, err))
    }
}

#[derive(Debug, Clone)]
pub struct AmazonCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub seller_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub configured: bool,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marketplace {
    Us,
    Ca,
    Mx,
    Br,
    Uk,
    De,
    Fr,
    It,
    Es,
    Nl,
    Se,
    Pl,
    Jp,
    Au,
    Sg,
    Ae,
    In,
}

impl Marketplace {
    pub const ALL: [Marketplace; 17] = [
        Marketplace::Us,
        Marketplace::Ca,
        Marketplace::Mx,
        Marketplace::Br,
        Marketplace::Uk,
        Marketplace::De,
        Marketplace::Fr,
        Marketplace::It,
        Marketplace::Es,
        Marketplace::Nl,
        Marketplace::Se,
        Marketplace::Pl,
        Marketplace::Jp,
        Marketplace::Au,
        Marketplace::Sg,
        Marketplace::Ae,
        Marketplace::In,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Marketplace::Us => "ATVPDKIKX0DER",
            Marketplace::Ca => "A2EUQ1WTGCTBG2",
            Marketplace::Mx => "A1AM78C64UM0Y8",
            Marketplace::Br => "A2Q3Y263D00KWC",
            Marketplace::Uk => "A1F83G8C2ARO7P",
            Marketplace::De => "A1PA6795UKMFR9",
            Marketplace::Fr => "A13V1IB3VIYZZH",
            Marketplace::It => "APJ6JRA9NG5V4",
            Marketplace::Es => "A1RKKUPIHCS9HS",
            Marketplace::Nl => "A1805IZSGTT6HS",
            Marketplace::Se => "A2NODRKZP88ZB9",
            Marketplace::Pl => "A1C3SOZRARQ6R3",
            Marketplace::Jp => "A1VC38T7YXB528",
            Marketplace::Au => "A39IBJ37TRP1C6",
            Marketplace::Sg => "A19VAU5U5O7RUS",
            Marketplace::Ae => "A2VIGQ35RCS4UG",
            Marketplace::In => "A21TJRUUN4KGV",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Marketplace::Us => "US",
            Marketplace::Ca => "CA",
            Marketplace::Mx => "MX",
            Marketplace::Br => "BR",
            Marketplace::Uk => "UK",
            Marketplace::De => "DE",
            Marketplace::Fr => "FR",
            Marketplace::It => "IT",
            Marketplace::Es => "ES",
            Marketplace::Nl => "NL",
            Marketplace::Se => "SE",
            Marketplace::Pl => "PL",
            Marketplace::Jp => "JP",
            Marketplace::Au => "AU",
            Marketplace::Sg => "SG",
            Marketplace::Ae => "AE",
            Marketplace::In => "IN",
        }
    }

    /// Accepts a country code ("us", "UK") or a raw marketplace id
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code().eq_ignore_ascii_case(s) || m.id() == s)
    }
}

pub mod report_type {
    pub const SETTLEMENT_V2: &str = "GET_V2_SETTLEMENT_REPORT_DATA_FLAT_FILE_V2";
    pub const FLAT_FILE_ORDERS: &str = "GET_FLAT_FILE_ALL_ORDERS_DATA_BY_ORDER_DATE_GENERAL";
    pub const FBA_INVENTORY: &str = "GET_FBA_INVENTORY_AGED_DATA";
    pub const FBA_RETURNS: &str = "GET_FBA_FULFILLMENT_CUSTOMER_RETURNS_DATA";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportProcessingStatus {
    Cancelled,
    Done,
    Fatal,
    InProgress,
    InQueue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub report_type: String,
    pub marketplace_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    pub report_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatus {
    pub report_id: String,
    pub report_type: String,
    pub processing_status: ReportProcessingStatus,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub report_document_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_document_id: String,
    pub url: String,
    #[serde(default)]
    pub compression_algorithm: Option<String>,
}

// Financial events (Finances API v0). Only the event lists the portal
// aggregates are modelled; serde skips the rest.

/// Envelope keys are lowercase (`payload`, `errors`); the payload itself is PascalCase
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialEventsResponse {
    #[serde(default)]
    pub payload: Option<FinancialEventsPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FinancialEventsPayload {
    #[serde(default)]
    pub financial_events: Option<FinancialEventGroup>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FinancialEventGroup {
    pub shipment_event_list: Vec<ShipmentEvent>,
    pub refund_event_list: Vec<ShipmentEvent>,
    pub chargeback_event_list: Vec<ShipmentEvent>,
    pub service_fee_event_list: Vec<ServiceFeeEvent>,
    pub product_ads_payment_event_list: Vec<ProductAdsPaymentEvent>,
    pub adjustment_event_list: Vec<AdjustmentEvent>,
    pub coupon_payment_event_list: Vec<CouponPaymentEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShipmentEvent {
    pub amazon_order_id: Option<String>,
    pub posted_date: Option<String>,
    pub shipment_fee_list: Vec<FeeComponent>,
    pub order_fee_list: Vec<FeeComponent>,
    pub shipment_item_list: Vec<ShipmentItem>,
    pub shipment_item_adjustment_list: Vec<ShipmentItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShipmentItem {
    #[serde(rename = "SellerSKU")]
    pub seller_sku: Option<String>,
    pub quantity_shipped: Option<i64>,
    pub item_charge_list: Vec<ChargeComponent>,
    pub item_charge_adjustment_list: Vec<ChargeComponent>,
    pub item_fee_list: Vec<FeeComponent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChargeComponent {
    pub charge_type: Option<String>,
    pub charge_amount: Option<Currency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FeeComponent {
    pub fee_type: Option<String>,
    pub fee_amount: Option<Currency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Currency {
    pub currency_code: Option<String>,
    pub currency_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceFeeEvent {
    pub amazon_order_id: Option<String>,
    pub fee_reason: Option<String>,
    pub fee_list: Vec<FeeComponent>,
}

/// Amazon serializes this event in camelCase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductAdsPaymentEvent {
    pub posted_date: Option<String>,
    pub transaction_type: Option<String>,
    pub transaction_value: Option<Currency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdjustmentEvent {
    pub adjustment_type: Option<String>,
    pub adjustment_amount: Option<Currency>,
    pub adjustment_item_list: Vec<AdjustmentItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdjustmentItem {
    #[serde(rename = "SellerSKU")]
    pub seller_sku: Option<String>,
    pub total_amount: Option<Currency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CouponPaymentEvent {
    pub coupon_id: Option<String>,
    pub total_amount: Option<Currency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marketplace_parse_accepts_code_and_id() {
        assert_eq!(Marketplace::parse("us"), Some(Marketplace::Us));
        assert_eq!(Marketplace::parse("A1PA6795UKMFR9"), Some(Marketplace::De));
        assert_eq!(Marketplace::parse("XX"), None);
    }

    #[test]
    fn financial_events_payload_deserializes() {
        let json = r#"{
            "payload": {
                "NextToken": "abc",
                "FinancialEvents": {
                    "ShipmentEventList": [{
                        "AmazonOrderId": "111-222",
                        "ShipmentItemList": [{
                            "SellerSKU": "MNQ15",
                            "QuantityShipped": 2,
                            "ItemChargeList": [
                                {"ChargeType": "Principal", "ChargeAmount": {"CurrencyCode": "USD", "CurrencyAmount": 59.98}}
                            ]
                        }]
                    }],
                    "ProductAdsPaymentEventList": [
                        {"transactionType": "Charge", "transactionValue": {"CurrencyAmount": -12.5}}
                    ]
                }
            }
        }"#;
        let parsed: FinancialEventsResponse = serde_json::from_str(json).unwrap();
        let payload = parsed.payload.unwrap();
        assert_eq!(payload.next_token.as_deref(), Some("abc"));
        let group = payload.financial_events.unwrap();
        let item = &group.shipment_event_list[0].shipment_item_list[0];
        assert_eq!(item.seller_sku.as_deref(), Some("MNQ15"));
        assert_eq!(item.quantity_shipped, Some(2));
        assert_eq!(
            group.product_ads_payment_event_list[0]
                .transaction_value
                .as_ref()
                .and_then(|c| c.currency_amount),
            Some(-12.5)
        );
        assert!(group.refund_event_list.is_empty());
    }

    #[test]
    fn pascal_case_envelope_is_not_a_payload() {
        let parsed: FinancialEventsResponse =
            serde_json::from_str(r#"{"Payload": {"FinancialEvents": {}}}"#).unwrap();
        assert!(parsed.payload.is_none());
    }
}
