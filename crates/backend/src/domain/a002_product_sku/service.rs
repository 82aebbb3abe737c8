use super::repository;
use contracts::domain::a002_product_sku::aggregate::{ProductSku, ProductSkuDto};
use uuid::Uuid;

pub async fn create(dto: ProductSkuDto) -> anyhow::Result<Uuid> {
    let mut aggregate = ProductSku::new_for_insert(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_code(&aggregate.base.code).await?.is_some() {
        anyhow::bail!("SKU {} already exists", aggregate.base.code);
    }

    aggregate.before_write();
    repository::insert(&aggregate).await
}

pub async fn update(dto: ProductSkuDto) -> anyhow::Result<()> {
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

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<ProductSku>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<ProductSku>> {
    repository::list_all().await
}

/// SKUs that can still be forecast and ordered
pub async fn list_active() -> anyhow::Result<Vec<ProductSku>> {
    repository::list_active().await
}
