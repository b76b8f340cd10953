use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateSweetRequest, RestockRequest, SearchQuery, UpdateSweetRequest},
    repo_types::Sweet,
    services,
};
use crate::{
    auth::{access::require_admin, extractors::Session},
    error::Result,
    json::AppJson,
    state::AppState,
};

/// Reads and purchase need any session; the rest check for the admin role.
pub fn sweet_routes() -> Router<AppState> {
    Router::new()
        .route("/sweets", get(list_sweets).post(create_sweet))
        .route("/sweets/search", get(search_sweets))
        .route("/sweets/category/:category", get(list_by_category))
        .route("/sweets/:id", get(get_sweet).patch(update_sweet).delete(delete_sweet))
        .route("/sweets/:id/purchase", post(purchase_sweet))
        .route("/sweets/:id/restock", post(restock_sweet))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user_id))]
pub async fn create_sweet(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<CreateSweetRequest>,
) -> Result<(StatusCode, Json<Sweet>)> {
    require_admin(&session)?;
    let sweet = services::create(state.sweets.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(sweet)))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn list_sweets(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Sweet>>> {
    Ok(Json(services::list(state.sweets.as_ref()).await?))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn list_by_category(
    State(state): State<AppState>,
    session: Session,
    Path(category): Path<String>,
) -> Result<Json<Vec<Sweet>>> {
    Ok(Json(services::list_by_category(state.sweets.as_ref(), &category).await?))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn search_sweets(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Sweet>>> {
    Ok(Json(services::search(state.sweets.as_ref(), params.q.as_deref()).await?))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn get_sweet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Sweet>> {
    Ok(Json(services::get_by_id(state.sweets.as_ref(), id).await?))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user_id))]
pub async fn update_sweet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<UpdateSweetRequest>,
) -> Result<Json<Sweet>> {
    require_admin(&session)?;
    Ok(Json(services::update(state.sweets.as_ref(), id, body).await?))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn delete_sweet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Sweet>> {
    require_admin(&session)?;
    Ok(Json(services::remove(state.sweets.as_ref(), id).await?))
}

/// Any signed-in user may buy; stock drops by one immediately.
#[instrument(skip(state, session), fields(user_id = %session.user_id, email = %session.email))]
pub async fn purchase_sweet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Sweet>> {
    Ok(Json(services::purchase(state.sweets.as_ref(), id).await?))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user_id))]
pub async fn restock_sweet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<RestockRequest>,
) -> Result<Json<Sweet>> {
    require_admin(&session)?;
    Ok(Json(services::restock(state.sweets.as_ref(), id, body.quantity).await?))
}
