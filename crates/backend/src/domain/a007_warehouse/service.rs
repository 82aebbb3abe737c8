use super::repository;
use contracts::domain::a007_warehouse::aggregate::{Warehouse, WarehouseDto};
use uuid::Uuid;

/// New warehouses belong to the creator's organization
pub async fn create(dto: WarehouseDto, organization_id: Option<String>) -> anyhow::Result<Uuid> {
    let mut aggregate = Warehouse::new_for_insert(&dto, organization_id);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_code(&aggregate.base.code).await?.is_some() {
        anyhow::bail!("Warehouse code {} already exists", aggregate.base.code);
    }

    aggregate.before_write();
    repository::insert(&aggregate).await
}

pub async fn update(dto: WarehouseDto) -> anyhow::Result<()> {
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

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Warehouse>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<Warehouse>> {
    repository::list_all().await
}
