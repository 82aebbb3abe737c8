use super::repository;
use contracts::domain::a009_organization_connection::aggregate::{
    OrganizationConnection, OrganizationConnectionDto,
};
use uuid::Uuid;

use crate::domain::a001_organization;
use crate::shared::errors::{ServiceError, ServiceResult};

async fn ensure_organization_exists(id: &str) -> ServiceResult<()> {
    match a001_organization::service::find(id).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found(format!("Organization {} not found", id))),
    }
}

async fn ensure_unique_pair(aggregate: &OrganizationConnection) -> ServiceResult<()> {
    let existing = repository::find_pair(
        &aggregate.source_organization_id,
        &aggregate.target_organization_id,
        aggregate.connection_type,
    )
    .await?;
    match existing {
        Some(other) if other.base.id != aggregate.base.id => Err(ServiceError::conflict(
            "Connection between these organizations already exists",
        )),
        _ => Ok(()),
    }
}

pub async fn create(dto: OrganizationConnectionDto) -> ServiceResult<Uuid> {
    let mut aggregate = OrganizationConnection::new_for_insert(&dto);
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;

    ensure_organization_exists(&aggregate.source_organization_id).await?;
    ensure_organization_exists(&aggregate.target_organization_id).await?;
    ensure_unique_pair(&aggregate).await?;

    aggregate.before_write();
    let id = repository::insert(&aggregate).await?;
    tracing::info!("Organization connection {} created", aggregate.base.description);
    Ok(id)
}

pub async fn update(dto: OrganizationConnectionDto) -> ServiceResult<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::bad_request("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Connection not found"))?;

    aggregate.update(&dto);
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;
    ensure_unique_pair(&aggregate).await?;

    aggregate.before_write();
    repository::update(&aggregate).await?;
    Ok(())
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<OrganizationConnection>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<OrganizationConnection>> {
    repository::list_all().await
}

pub async fn list_for_organization(
    organization_id: &str,
) -> anyhow::Result<Vec<OrganizationConnection>> {
    repository::list_for_organization(organization_id).await
}
