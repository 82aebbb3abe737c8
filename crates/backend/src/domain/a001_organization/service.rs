use super::repository;
use contracts::domain::a001_organization::aggregate::{
    Organization, OrganizationDto, OrganizationType,
};
use contracts::system::auth::TokenClaims;
use uuid::Uuid;

/// Code of the portal operator's own organization
pub const INTERNAL_CODE: &str = "BDI";

pub async fn create(dto: OrganizationDto) -> anyhow::Result<Uuid> {
    let mut aggregate = Organization::new_for_insert(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_code(&aggregate.base.code).await?.is_some() {
        anyhow::bail!("Organization code {} already exists", aggregate.base.code);
    }

    aggregate.before_write();
    repository::insert(&aggregate).await
}

pub async fn update(dto: OrganizationDto) -> anyhow::Result<()> {
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

    if let Some(other) = repository::get_by_code(&aggregate.base.code).await? {
        if other.base.id != aggregate.base.id {
            anyhow::bail!("Organization code {} already exists", aggregate.base.code);
        }
    }

    aggregate.before_write();
    repository::update(&aggregate).await
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Organization>> {
    repository::get_by_id(id).await
}

pub async fn get_by_code(code: &str) -> anyhow::Result<Option<Organization>> {
    repository::get_by_code(&code.trim().to_uppercase()).await
}

pub async fn list_all() -> anyhow::Result<Vec<Organization>> {
    repository::list_all().await
}

/// Looks up an organization by its id string, ignoring malformed ids
pub async fn find(id: &str) -> anyhow::Result<Option<Organization>> {
    match Uuid::parse_str(id) {
        Ok(uuid) => repository::get_by_id(uuid).await,
        Err(_) => Ok(None),
    }
}

/// Creates the internal organization on an empty database and returns its id
pub async fn ensure_internal_organization() -> anyhow::Result<Uuid> {
    if let Some(existing) = repository::get_by_code(INTERNAL_CODE).await? {
        return Ok(existing.base.id.value());
    }

    let dto = OrganizationDto {
        id: None,
        code: INTERNAL_CODE.into(),
        description: "Boundless Devices Inc".into(),
        legal_name: Some("Boundless Devices Inc".into()),
        org_type: OrganizationType::Internal,
        po_code_2_digit: None,
        contact_email: None,
        contact_phone: None,
        address: None,
        is_active: Some(true),
        enabled_pages: None,
        comment: None,
    };
    let id = create(dto).await?;
    tracing::info!("Created internal organization {}", INTERNAL_CODE);
    Ok(id)
}

/// Organization the signed-in user belongs to
pub async fn of_caller(claims: &TokenClaims) -> anyhow::Result<Option<Organization>> {
    match &claims.organization_id {
        Some(id) => find(id).await,
        None => Ok(None),
    }
}
