use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        extractors::Session,
        jwt::JwtKeys,
        repo_types::PublicUser,
        services,
    },
    error::{AppError, Result},
    json::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    let user = services::register(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let res = services::login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(res))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id, email = %session.email))]
pub async fn get_me(State(state): State<AppState>, session: Session) -> Result<Json<PublicUser>> {
    let user = state.users.find_by_id(session.user_id).await?.ok_or_else(|| {
        error!(user_id = %session.user_id, "session user not found");
        AppError::Unauthorized("User not found".into())
    })?;
    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use crate::auth::claims::Role;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Admin,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"role\":\"ADMIN\""));
        assert!(json.contains("1970-01-01T00:00:00Z"));
    }
}
