use super::repository;
use chrono::NaiveDate;
use contracts::domain::a004_purchase_order::aggregate::{PurchaseOrder, PurchaseOrderDto};
use contracts::system::auth::TokenClaims;
use uuid::Uuid;

use crate::domain::a001_organization;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::shared::format::format_usd;

/// Number, supplier and order date are mandatory on create
fn required_fields(dto: &PurchaseOrderDto) -> ServiceResult<(String, NaiveDate)> {
    let number = dto.purchase_order_number.as_deref().map(str::trim).unwrap_or("");
    let supplier = dto.supplier_name.as_deref().map(str::trim).unwrap_or("");
    match dto.purchase_order_date {
        Some(date) if !number.is_empty() && !supplier.is_empty() => Ok((number.to_string(), date)),
        _ => Err(ServiceError::bad_request(
            "Purchase order number, supplier and date are required",
        )),
    }
}

pub async fn create(dto: PurchaseOrderDto, claims: &TokenClaims) -> ServiceResult<Uuid> {
    let (number, order_date) = required_fields(&dto)?;

    if repository::get_by_code(&number).await?.is_some() {
        return Err(ServiceError::conflict(format!(
            "Purchase order {} already exists",
            number
        )));
    }

    let mut aggregate = PurchaseOrder::new_for_insert(
        &dto,
        order_date,
        claims.organization_id.clone(),
        claims.sub.clone(),
    );
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!(
        "Purchase order {} created for {} ({} lines, total {})",
        aggregate.base.code,
        aggregate.supplier_name,
        aggregate.lines.len(),
        format_usd(aggregate.total_value)
    );
    Ok(id)
}

pub async fn update(dto: PurchaseOrderDto, claims: &TokenClaims) -> ServiceResult<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::bad_request("Invalid ID"))?;

    let mut aggregate = get_visible(id, claims)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase order not found"))?;

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

/// The order, if the caller may see it
pub async fn get_visible(id: Uuid, claims: &TokenClaims) -> anyhow::Result<Option<PurchaseOrder>> {
    let Some(order) = repository::get_by_id(id).await? else {
        return Ok(None);
    };
    if claims.is_super_admin() {
        return Ok(Some(order));
    }
    let visible = match a001_organization::service::of_caller(claims).await? {
        Some(org) => order.is_visible_to(&org.base.id.value().to_string(), &org.base.code),
        None => false,
    };
    Ok(visible.then_some(order))
}

pub async fn list_for(claims: &TokenClaims) -> anyhow::Result<Vec<PurchaseOrder>> {
    if claims.is_super_admin() {
        return repository::list_all().await;
    }
    match a001_organization::service::of_caller(claims).await? {
        Some(org) => {
            repository::list_visible_to(&org.base.id.value().to_string(), &org.base.code).await
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_number_supplier_and_date() {
        let mut dto = PurchaseOrderDto {
            purchase_order_number: Some("PO-2025-001".into()),
            supplier_name: Some("MTN".into()),
            ..Default::default()
        };
        assert!(required_fields(&dto).is_err());

        dto.purchase_order_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let (number, date) = required_fields(&dto).unwrap();
        assert_eq!(number, "PO-2025-001");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        dto.supplier_name = Some("  ".into());
        assert!(required_fields(&dto).is_err());
    }
}
