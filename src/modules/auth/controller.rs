use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use tracing::instrument;
use validator::Validate;

use studentdb_core::AppError;
use studentdb_models::auth::{
    MessageResponse, PrincipalResponse, RegisterRequest, TokenRequest, TokenResponse,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::{ValidatedJson, format_errors};

use super::service::AuthService;

/// Register a new account
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::register(state.credentials.as_ref(), dto).await?;
    Ok(Json(MessageResponse::new("User registered")))
}

/// Exchange form-encoded `username` and `password` for a bearer token
#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(dto) = form.map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.body_text())))?;
    dto.validate()
        .map_err(|errors| AppError::unprocessable(anyhow::anyhow!(format_errors(&errors))))?;

    let response = AuthService::login(state.credentials.as_ref(), &state.tokens, dto).await?;
    Ok(Json(response))
}

/// Acknowledge a logout.
///
/// Tokens are stateless and are not revoked: a token stays valid until it
/// expires. Clients should simply discard it.
#[instrument]
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Logged out (no real effect in stateless JWT auth)",
    ))
}

/// The authenticated principal
#[instrument(skip(auth_user), fields(username = %auth_user.username))]
pub async fn me(auth_user: AuthUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        username: auth_user.username,
        read_only: auth_user.read_only,
    })
}
