use tokio::net::TcpListener;
use visitor_log::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let pool = visitor_log::db::init_pool(&config.database_url).await;

    let app = visitor_log::build_app(pool)
        .await
        .expect("Failed to load persisted visitors");

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
