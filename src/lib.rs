pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod register;
pub mod routes;
pub mod store;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use axum::http::{header, HeaderValue};
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::register::SharedRegister;
use crate::store::KvStore;

#[derive(Clone)]
pub struct AppState {
    pub register: SharedRegister,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool` beforehand.
/// The persisted visitor list is loaded here, once, before any route can run.
pub async fn build_app(pool: SqlitePool) -> Result<Router, sqlx::Error> {
    let register = SharedRegister::load(KvStore::new(pool)).await?;
    let state = AppState { register };

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::visitors::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(app)
}
