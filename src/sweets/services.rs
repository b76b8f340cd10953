use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateSweetRequest, UpdateSweetRequest},
    repo::SweetStore,
    repo_types::{NewSweet, Sweet, SweetPatch},
    validators::validate_restock_amount,
};
use crate::error::{AppError, Result, StoreError};

fn not_found(id: Uuid) -> AppError {
    warn!(%id, "sweet not found");
    AppError::NotFound("Sweet not found".into())
}

fn map_store(id: Uuid, e: StoreError) -> AppError {
    match e {
        StoreError::NotFound => not_found(id),
        other => other.into(),
    }
}

pub async fn create(store: &dyn SweetStore, req: CreateSweetRequest) -> Result<Sweet> {
    let new = NewSweet::try_from(req)?;
    let sweet = store.insert(new).await?;
    info!(id = %sweet.id, name = %sweet.name, quantity = sweet.quantity, "sweet created");
    Ok(sweet)
}

pub async fn list(store: &dyn SweetStore) -> Result<Vec<Sweet>> {
    Ok(store.list().await?)
}

pub async fn list_by_category(store: &dyn SweetStore, category: &str) -> Result<Vec<Sweet>> {
    Ok(store.list_by_category(category).await?)
}

pub async fn search(store: &dyn SweetStore, query: Option<&str>) -> Result<Vec<Sweet>> {
    Ok(store.search(query.unwrap_or_default().trim()).await?)
}

pub async fn get_by_id(store: &dyn SweetStore, id: Uuid) -> Result<Sweet> {
    store.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(store: &dyn SweetStore, id: Uuid, req: UpdateSweetRequest) -> Result<Sweet> {
    let patch = SweetPatch::try_from(req)?;
    let sweet = store.update(id, patch).await.map_err(|e| map_store(id, e))?;
    info!(%id, quantity = sweet.quantity, "sweet updated");
    Ok(sweet)
}

pub async fn remove(store: &dyn SweetStore, id: Uuid) -> Result<Sweet> {
    let sweet = store.delete(id).await.map_err(|e| map_store(id, e))?;
    info!(%id, name = %sweet.name, "sweet deleted");
    Ok(sweet)
}

pub async fn purchase(store: &dyn SweetStore, id: Uuid) -> Result<Sweet> {
    let sweet = store.purchase(id).await.map_err(|e| {
        if matches!(e, StoreError::OutOfStock) {
            warn!(%id, "purchase refused: out of stock");
        }
        map_store(id, e)
    })?;
    info!(%id, remaining = sweet.quantity, "sweet purchased");
    Ok(sweet)
}

pub async fn restock(store: &dyn SweetStore, id: Uuid, amount: i64) -> Result<Sweet> {
    let amount = validate_restock_amount(amount)?;
    let sweet = store.restock(id, amount).await.map_err(|e| map_store(id, e))?;
    info!(%id, amount, quantity = sweet.quantity, "sweet restocked");
    Ok(sweet)
}
