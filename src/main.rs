use ks_api::{config, database, routes};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, KS_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting KS API in {:?} mode", config.environment);

    // Serve even when the database is down; handlers answer 503 until it
    // comes back and the pool initializes on restart
    if let Err(e) = database::manager::init().await {
        tracing::warn!("database not available at startup: {}", e);
    }

    let app = routes::app();

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("KS API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
