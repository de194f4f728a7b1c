use axum::Router;

pub mod capabilities;
pub mod config;
pub mod database;
pub mod errors;
pub mod identity;
pub mod models;
pub mod router;
pub mod routes;
pub mod s3;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn app(app_state: AppState) -> Router {
    router::create_router(app_state)
}
