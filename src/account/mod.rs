use axum::{middleware, Router};

use crate::{auth::middleware::require_auth, state::AppState};

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new().merge(handlers::account_routes()).merge(
        handlers::profile_routes()
            .route_layer(middleware::from_fn_with_state(state, require_auth)),
    )
}
