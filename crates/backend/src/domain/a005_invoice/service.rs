use super::repository;
use chrono::Utc;
use contracts::domain::a005_invoice::aggregate::{Invoice, InvoiceDto};
use contracts::system::auth::TokenClaims;
use uuid::Uuid;

use crate::shared::errors::{ServiceError, ServiceResult};

pub async fn create(dto: InvoiceDto, claims: &TokenClaims) -> ServiceResult<Uuid> {
    let number = dto.invoice_number.as_deref().map(str::trim).unwrap_or("");
    let customer = dto.customer_name.as_deref().map(str::trim).unwrap_or("");
    if number.is_empty() || customer.is_empty() {
        return Err(ServiceError::bad_request(
            "Invoice number and customer are required",
        ));
    }
    if repository::get_by_code(number).await?.is_some() {
        return Err(ServiceError::conflict(format!("Invoice {} already exists", number)));
    }

    let invoice_date = dto.invoice_date.unwrap_or_else(|| Utc::now().date_naive());
    let mut aggregate = Invoice::new_for_insert(
        &dto,
        invoice_date,
        claims.organization_id.clone(),
        claims.sub.clone(),
    );
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!(
        "Invoice {} created for {} (total {:.2})",
        aggregate.base.code,
        aggregate.customer_name,
        aggregate.total_value
    );
    Ok(id)
}

pub async fn update(dto: InvoiceDto, claims: &TokenClaims) -> ServiceResult<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::bad_request("Invalid ID"))?;

    let mut aggregate = get_visible(id, claims)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invoice not found"))?;

    aggregate.update(&dto);
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    aggregate.before_write();
    repository::update(&aggregate).await?;
    Ok(())
}

pub async fn delete(id: Uuid, claims: &TokenClaims) -> anyhow::Result<bool> {
    if get_visible(id, claims).await?.is_none() {
        return Ok(false);
    }
    repository::soft_delete(id).await
}

/// Invoices belong to the organization that issued them
pub async fn get_visible(id: Uuid, claims: &TokenClaims) -> anyhow::Result<Option<Invoice>> {
    let invoice = repository::get_by_id(id).await?;
    Ok(invoice.filter(|i| {
        claims.is_super_admin()
            || (claims.organization_id.is_some() && i.organization_id == claims.organization_id)
    }))
}

pub async fn list_for(claims: &TokenClaims) -> anyhow::Result<Vec<Invoice>> {
    if claims.is_super_admin() {
        return repository::list(None).await;
    }
    match &claims.organization_id {
        Some(org) => repository::list(Some(org)).await,
        None => Ok(Vec::new()),
    }
}
