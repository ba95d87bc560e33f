use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::store::SharedStore;

pub mod reports;

pub fn app(store: SharedStore, cors_origin: Option<&str>) -> Result<Router> {
    let origin = match cors_origin {
        Some(origin) => AllowOrigin::exact(origin.parse::<HeaderValue>()?),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Ok(Router::new()
        .merge(reports::routes(store))
        .route("/health", get(|| async { "✅ Reports backend up" }))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
