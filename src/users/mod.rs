use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;

pub use memory::InMemoryUserStore;
pub use repo::{PgUserStore, StoreError, UserStore};
pub use repo_types::User;

pub fn router(state: AppState) -> Router<AppState> {
    handlers::user_routes(state)
}
