use crate::state::AppState;
use axum::Router;

pub mod account;

pub fn all_routes() -> Router<AppState> {
    let v1 = Router::new().merge(account::create_route_v1());

    Router::new()
        .nest("/v1", v1)
        .merge(account::create_route())
}
