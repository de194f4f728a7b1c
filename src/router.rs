use crate::{errors, routes, state};
use axum::{
    http::{self, header, HeaderName, Method},
    response::Response,
    Router,
};
use std::any::Any;
use tower_http::{
    catch_panic, cors, propagate_header, sensitive_headers, trace,
};

/// Headers a browser client may send on the deletion call.
pub const CORS_ALLOWED_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    HeaderName::from_static("x-client-info"),
    HeaderName::from_static("apikey"),
    header::CONTENT_TYPE,
];

/// Any-origin CORS. Every `OPTIONS` request is answered here and never
/// reaches a handler.
fn cors_layer() -> cors::CorsLayer {
    cors::CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(CORS_ALLOWED_HEADERS)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(detail, "Request handler panicked");

    errors::internal_error_response()
}

pub fn create_router(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::all_routes())
        .layer(catch_panic::CatchPanicLayer::custom(handle_panic))
        .layer(
            trace::TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().include_headers(true))
                .on_request(trace::DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(sensitive_headers::SetSensitiveHeadersLayer::new(
            std::iter::once(http::header::AUTHORIZATION),
        ))
        .layer(propagate_header::PropagateHeaderLayer::new(
            HeaderName::from_static("x-request-id"),
        ))
        .layer(cors_layer())
        .with_state(state)
}
