use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for InvoiceId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(InvoiceId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Submitted => "submitted",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "submitted" => InvoiceStatus::Submitted,
            "approved" => InvoiceStatus::Approved,
            "paid" => InvoiceStatus::Paid,
            "cancelled" => InvoiceStatus::Cancelled,
            _ => InvoiceStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankDetails {
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_routing_number: Option<String>,
    pub bank_swift_code: Option<String>,
    pub bank_iban: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub sku_id: String,
    pub sku_code: String,
    pub sku_name: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_cost: f64,
    #[serde(default)]
    pub line_total: f64,
}

/// Invoice to a customer. `base.code` is the invoice number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(flatten)]
    pub base: BaseAggregate<InvoiceId>,

    pub customer_name: String,
    pub invoice_date: NaiveDate,
    pub requested_delivery_week: Option<String>,
    pub status: InvoiceStatus,
    pub terms: Option<String>,
    pub incoterms: Option<String>,
    pub incoterms_location: Option<String>,
    pub bank: BankDetails,
    pub total_value: f64,
    pub notes: Option<String>,
    pub organization_id: Option<String>,
    pub created_by: String,
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    pub fn new_for_insert(
        dto: &InvoiceDto,
        invoice_date: NaiveDate,
        organization_id: Option<String>,
        created_by: String,
    ) -> Self {
        let number = dto.invoice_number.clone().unwrap_or_default();
        let customer = dto.customer_name.clone().unwrap_or_default();
        let description = format!("{} / {}", number, customer);
        let mut base = BaseAggregate::new(InvoiceId::new_v4(), number, description);
        base.comment = dto.comment.clone();

        let mut invoice = Self {
            base,
            customer_name: customer,
            invoice_date,
            requested_delivery_week: dto.requested_delivery_week.clone(),
            status: dto.status.unwrap_or_default(),
            terms: dto.terms.clone(),
            incoterms: dto.incoterms.clone(),
            incoterms_location: dto.incoterms_location.clone(),
            bank: dto.bank.clone().unwrap_or_default(),
            total_value: 0.0,
            notes: dto.notes.clone(),
            organization_id,
            created_by,
            lines: dto.lines.clone().unwrap_or_default(),
        };
        invoice.recalculate_totals();
        invoice
    }

    pub fn update(&mut self, dto: &InvoiceDto) {
        if let Some(customer) = &dto.customer_name {
            self.customer_name = customer.clone();
        }
        if let Some(date) = dto.invoice_date {
            self.invoice_date = date;
        }
        if dto.requested_delivery_week.is_some() {
            self.requested_delivery_week = dto.requested_delivery_week.clone();
        }
        if let Some(status) = dto.status {
            self.status = status;
        }
        if dto.terms.is_some() {
            self.terms = dto.terms.clone();
        }
        if dto.incoterms.is_some() {
            self.incoterms = dto.incoterms.clone();
        }
        if dto.incoterms_location.is_some() {
            self.incoterms_location = dto.incoterms_location.clone();
        }
        if let Some(bank) = &dto.bank {
            self.bank = bank.clone();
        }
        if dto.notes.is_some() {
            self.notes = dto.notes.clone();
        }
        if let Some(lines) = &dto.lines {
            self.lines = lines.clone();
        }
        self.base.description = format!("{} / {}", self.base.code, self.customer_name);
        self.base.comment = dto.comment.clone();
        self.recalculate_totals();
    }

    pub fn recalculate_totals(&mut self) {
        for line in &mut self.lines {
            line.line_total = line.quantity as f64 * line.unit_cost;
        }
        self.total_value = self.lines.iter().map(|l| l.line_total).sum();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Invoice number is required".into());
        }
        if self.customer_name.trim().is_empty() {
            return Err("Customer name is required".into());
        }
        if self.lines.iter().any(|l| l.quantity <= 0) {
            return Err("Line quantities must be positive".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.recalculate_totals();
        self.base.touch();
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a005"
    }

    fn collection_name() -> &'static str {
        "invoice"
    }

    fn element_name() -> &'static str {
        "Invoice"
    }

    fn list_name() -> &'static str {
        "Invoices"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InvoiceDto {
    pub id: Option<String>,
    #[serde(alias = "invoiceNumber")]
    pub invoice_number: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(alias = "invoiceDate")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(alias = "requestedDeliveryWeek")]
    pub requested_delivery_week: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub terms: Option<String>,
    pub incoterms: Option<String>,
    #[serde(alias = "incotermsLocation")]
    pub incoterms_location: Option<String>,
    pub bank: Option<BankDetails>,
    pub notes: Option<String>,
    pub lines: Option<Vec<InvoiceLine>>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_line_totals() {
        let invoice = Invoice::new_for_insert(
            &InvoiceDto {
                invoice_number: Some("INV-1001".into()),
                customer_name: Some("Acme Retail".into()),
                lines: Some(vec![
                    InvoiceLine {
                        sku_id: "s1".into(),
                        sku_code: "A1".into(),
                        sku_name: None,
                        description: None,
                        quantity: 3,
                        unit_cost: 10.0,
                        line_total: 0.0,
                    },
                    InvoiceLine {
                        sku_id: "s2".into(),
                        sku_code: "B2".into(),
                        sku_name: None,
                        description: Some("cables".into()),
                        quantity: 2,
                        unit_cost: 1.25,
                        line_total: 99.0,
                    },
                ]),
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            None,
            "user-1".into(),
        );
        assert_eq!(invoice.lines[1].line_total, 2.5);
        assert_eq!(invoice.total_value, 32.5);
        assert!(invoice.validate().is_ok());
    }
}
