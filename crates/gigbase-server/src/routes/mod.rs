pub mod collections;
pub mod entries;
pub mod health;

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(entries::routes())
        .merge(health::routes())
        .with_state(state)
}
