use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod errors;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
#[cfg(test)]
pub(crate) mod memory_repo;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;
mod validation;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
