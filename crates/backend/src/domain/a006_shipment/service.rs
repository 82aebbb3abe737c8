use super::repository;
use chrono::Utc;
use contracts::domain::a003_sales_forecast::aggregate::MilestoneStatusRequest;
use contracts::domain::a006_shipment::aggregate::{Shipment, ShipmentDto, ShipmentStatusResponse};
use contracts::domain::common::{Milestone, SignalStatus};
use uuid::Uuid;

use crate::domain::a003_sales_forecast;
use crate::shared::errors::{ServiceError, ServiceResult};

const SHIPMENT_MILESTONES: [Milestone; 5] = [
    Milestone::Sales,
    Milestone::Factory,
    Milestone::Shipping,
    Milestone::Transit,
    Milestone::Warehouse,
];

pub async fn create(dto: ShipmentDto, created_by: String) -> ServiceResult<Uuid> {
    if dto.requested_quantity.is_none() {
        return Err(ServiceError::bad_request("Missing required fields"));
    }
    if let Some(forecast_id) = &dto.forecast_id {
        let exists = match Uuid::parse_str(forecast_id) {
            Ok(id) => a003_sales_forecast::service::get_by_id(id).await?.is_some(),
            Err(_) => false,
        };
        if !exists {
            return Err(ServiceError::not_found("Forecast not found"));
        }
    }

    let mut aggregate = Shipment::new_for_insert(&dto, created_by);
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!(
        "Shipment {} created: {} units in {} cartons",
        aggregate.base.code,
        aggregate.requested_quantity,
        aggregate.carton_count()
    );
    Ok(id)
}

pub async fn update(dto: ShipmentDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    aggregate.before_write();
    repository::update(&aggregate).await
}

/// `{milestone} status updated to {status}`, both lowercase
fn status_message(milestone: Milestone, status: SignalStatus) -> String {
    format!("{} status updated to {}", milestone.as_str(), status.as_str())
}

/// Records a milestone signal on the shipment and mirrors it onto the linked forecast
pub async fn update_status(
    id: Uuid,
    request: MilestoneStatusRequest,
) -> ServiceResult<ShipmentStatusResponse> {
    let (milestone, status) =
        a003_sales_forecast::service::parse_status_request(&request, &SHIPMENT_MILESTONES)?;

    let mut shipment = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Shipment not found"))?;

    shipment.apply_status(
        milestone,
        status,
        request.notes.as_deref(),
        Utc::now().date_naive(),
    );
    shipment.before_write();
    repository::update(&shipment).await?;

    let synced_forecast = match &shipment.forecast_id {
        Some(forecast_id) => {
            match a003_sales_forecast::service::sync_from_shipment(
                forecast_id,
                milestone,
                status,
                request.date_changes.as_ref(),
                request.date_change_reason.clone(),
            )
            .await
            {
                Ok(synced) => synced,
                Err(e) => {
                    tracing::error!(
                        "Shipment {} updated but forecast {} sync failed: {}",
                        shipment.base.code,
                        forecast_id,
                        e
                    );
                    false
                }
            }
        }
        None => false,
    };

    let message = status_message(milestone, status);
    Ok(ShipmentStatusResponse {
        success: true,
        shipment,
        message,
        synced_forecast,
    })
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Shipment>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<Shipment>> {
    repository::list_all().await
}

pub async fn list_by_forecast(forecast_id: &str) -> anyhow::Result<Vec<Shipment>> {
    repository::list_by_forecast(forecast_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_uses_lowercase_names() {
        assert_eq!(
            status_message(Milestone::Shipping, SignalStatus::Accepted),
            "shipping status updated to accepted"
        );
        assert_eq!(
            status_message(Milestone::Warehouse, SignalStatus::Submitted),
            "warehouse status updated to submitted"
        );
    }
}
