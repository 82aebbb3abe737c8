use super::repository;
use chrono::Utc;
use contracts::domain::a003_sales_forecast::aggregate::{
    ForecastDateChanges, MilestoneStatusRequest, SalesForecast, SalesForecastDto,
};
use contracts::domain::common::{Milestone, SignalStatus};
use contracts::system::auth::TokenClaims;
use uuid::Uuid;

use crate::domain::a002_product_sku;
use crate::shared::errors::{ServiceError, ServiceResult};

/// Milestones a forecast accepts status updates for. Shipping is driven by shipments.
const FORECAST_MILESTONES: [Milestone; 4] = [
    Milestone::Sales,
    Milestone::Factory,
    Milestone::Transit,
    Milestone::Warehouse,
];

/// Forecast writes are limited to planning roles
fn ensure_planner(claims: &TokenClaims) -> ServiceResult<()> {
    if claims.can_plan() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Insufficient permissions"))
    }
}

pub async fn create(dto: SalesForecastDto, claims: &TokenClaims) -> ServiceResult<Uuid> {
    ensure_planner(claims)?;

    let (Some(sku_id), Some(_), Some(_)) = (&dto.sku_id, &dto.delivery_week, dto.quantity) else {
        return Err(ServiceError::bad_request("Missing required fields"));
    };

    let sku = match Uuid::parse_str(sku_id) {
        Ok(uuid) => a002_product_sku::service::get_by_id(uuid).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ServiceError::not_found("SKU not found"))?;

    let mut aggregate = SalesForecast::new_for_insert(&dto, &sku.base.code, claims.sub.clone());
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!(
        "Forecast {} created for {} / {} x{}",
        aggregate.base.code,
        sku.base.code,
        aggregate.delivery_week,
        aggregate.quantity
    );
    Ok(id)
}

pub async fn update(dto: SalesForecastDto, claims: &TokenClaims) -> ServiceResult<()> {
    ensure_planner(claims)?;
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::bad_request("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Forecast not found"))?;

    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;

    aggregate.before_write();
    repository::update(&aggregate).await?;
    Ok(())
}

/// Checks the milestone/status pair of a status request
pub fn parse_status_request(
    request: &MilestoneStatusRequest,
    allowed: &[Milestone],
) -> ServiceResult<(Milestone, SignalStatus)> {
    let (Some(milestone), Some(status)) = (
        request.milestone.as_deref().filter(|m| !m.is_empty()),
        request.status.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(ServiceError::bad_request("Milestone and status are required"));
    };

    let milestone = Milestone::parse(milestone)
        .filter(|m| allowed.contains(m))
        .ok_or_else(|| ServiceError::bad_request("Invalid milestone type"))?;

    Ok((milestone, SignalStatus::from_str_lossy(status)))
}

pub async fn update_status(
    id: Uuid,
    request: MilestoneStatusRequest,
    claims: &TokenClaims,
) -> ServiceResult<SalesForecast> {
    ensure_planner(claims)?;
    let (milestone, status) = parse_status_request(&request, &FORECAST_MILESTONES)?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Forecast not found"))?;

    aggregate.apply_status(
        milestone,
        status,
        request.notes.as_deref(),
        Utc::now().date_naive(),
    );
    if let Some(changes) = &request.date_changes {
        aggregate.apply_date_changes(changes, request.date_change_reason.clone());
    }
    aggregate.before_write();
    repository::update(&aggregate).await?;

    tracing::info!(
        "Forecast {} {} signal set to {}",
        aggregate.base.code,
        milestone.as_str(),
        status.as_str()
    );
    Ok(aggregate)
}

/// Copies a shipment's milestone signal and date changes onto its forecast.
/// Returns false when the forecast no longer exists.
pub async fn sync_from_shipment(
    forecast_id: &str,
    milestone: Milestone,
    status: SignalStatus,
    date_changes: Option<&ForecastDateChanges>,
    date_change_reason: Option<String>,
) -> anyhow::Result<bool> {
    let Ok(id) = Uuid::parse_str(forecast_id) else {
        return Ok(false);
    };
    let Some(mut aggregate) = repository::get_by_id(id).await? else {
        return Ok(false);
    };

    aggregate.signals.set(milestone, status);
    if let Some(changes) = date_changes {
        aggregate.apply_date_changes(changes, date_change_reason);
    }
    aggregate.before_write();
    repository::update(&aggregate).await?;
    Ok(true)
}

pub async fn delete(id: Uuid, claims: &TokenClaims) -> ServiceResult<bool> {
    ensure_planner(claims)?;
    Ok(repository::soft_delete(id).await?)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<SalesForecast>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<SalesForecast>> {
    repository::list_all().await
}

pub async fn list_created_by(user_ids: &[String]) -> anyhow::Result<Vec<SalesForecast>> {
    repository::list_created_by(user_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::users::UserRole;

    fn claims(role: UserRole) -> TokenClaims {
        TokenClaims {
            sub: "user-1".into(),
            username: "someone".into(),
            role,
            organization_id: Some("org-1".into()),
            exp: usize::MAX,
            iat: 0,
        }
    }

    #[test]
    fn only_planning_roles_may_write() {
        assert!(ensure_planner(&claims(UserRole::Sales)).is_ok());
        assert!(ensure_planner(&claims(UserRole::Member)).is_ok());
        assert!(matches!(
            ensure_planner(&claims(UserRole::Developer)),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn non_planner_cannot_change_forecasts() {
        let developer = claims(UserRole::Developer);
        let id = Uuid::new_v4();
        let dto = SalesForecastDto {
            id: Some(id.to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update(dto, &developer).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            update_status(id, request(Some("sales"), Some("submitted")), &developer).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete(id, &developer).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    fn request(milestone: Option<&str>, status: Option<&str>) -> MilestoneStatusRequest {
        MilestoneStatusRequest {
            milestone: milestone.map(Into::into),
            status: status.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn status_request_needs_both_fields() {
        let err = parse_status_request(&request(Some("sales"), None), &FORECAST_MILESTONES)
            .unwrap_err();
        assert_eq!(err.to_string(), "Milestone and status are required");

        let err = parse_status_request(&request(None, Some("accepted")), &FORECAST_MILESTONES)
            .unwrap_err();
        assert_eq!(err.to_string(), "Milestone and status are required");
    }

    #[test]
    fn shipping_is_not_a_forecast_milestone() {
        let err = parse_status_request(
            &request(Some("shipping"), Some("accepted")),
            &FORECAST_MILESTONES,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid milestone type");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_status_values_become_unknown() {
        let (milestone, status) = parse_status_request(
            &request(Some("factory"), Some("maybe")),
            &FORECAST_MILESTONES,
        )
        .unwrap();
        assert_eq!(milestone, Milestone::Factory);
        assert_eq!(status, SignalStatus::Unknown);
    }
}
