use tracing::{info, instrument};

use studentdb_auth::TokenService;
use studentdb_core::{AppError, CredentialError};
use studentdb_db::CredentialStore;
use studentdb_models::auth::{RegisterRequest, TokenRequest, TokenResponse};

use crate::metrics::{
    track_jwt_issued, track_login_failure, track_login_success, track_user_registered,
};

pub struct AuthService;

impl AuthService {
    #[instrument(skip(credentials, dto), fields(username = %dto.username))]
    pub async fn register(
        credentials: &dyn CredentialStore,
        dto: RegisterRequest,
    ) -> Result<(), AppError> {
        credentials
            .register(&dto.username, &dto.password, dto.read_only)
            .await?;

        track_user_registered();
        info!("User registered");
        Ok(())
    }

    #[instrument(skip(credentials, tokens, dto), fields(username = %dto.username))]
    pub async fn login(
        credentials: &dyn CredentialStore,
        tokens: &TokenService,
        dto: TokenRequest,
    ) -> Result<TokenResponse, AppError> {
        let credential = match credentials.verify_login(&dto.username, &dto.password).await {
            Ok(credential) => credential,
            Err(e) => {
                if matches!(e, CredentialError::InvalidCredentials) {
                    track_login_failure("invalid_credentials");
                }
                return Err(e.into());
            }
        };

        let access_token = tokens.issue(&credential.username)?;

        track_login_success();
        track_jwt_issued();

        Ok(TokenResponse::bearer(access_token))
    }
}
