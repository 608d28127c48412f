use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest, SignupResponse, TokenResponse},
        errors::AuthError,
        extractors::AuthUser,
        services,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

fn bad_json(rejection: JsonRejection) -> AuthError {
    warn!(error = %rejection, "rejected request body");
    AuthError::Validation(rejection.body_text())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    let Json(payload) = payload.map_err(bad_json)?;
    services::signup(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let access_token = services::login(&state, payload).await?;
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = services::profile(&state, user_id).await?;
    Ok(Json(user))
}
