use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{logout, me, register, token};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(token))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
