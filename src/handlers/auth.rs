use crate::{
    auth::{AuthError, LoginCredentials, TokenResponse},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    summary = "Log in",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed body", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentials>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(credentials) =
        payload.map_err(|rejection| AuthError::BadRequest(rejection.body_text()))?;
    let token = state.auth.login(&credentials).await?;
    info!(email = %credentials.email, "issued access token");
    Ok(Json(token))
}
