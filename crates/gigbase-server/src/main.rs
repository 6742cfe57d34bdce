use std::sync::Arc;

use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gigbase_db::{init_database, open_stores, FsImageStore};
use gigbase_server::{routes, AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: GIGBASE_LISTEN_ADDR, GIGBASE_DB_PATH, GIGBASE_IMAGE_DIR");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Gigbase server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database path: {}", config.db_path.display());
    tracing::info!("Image directory: {}", config.image_dir.display());

    // Initialize database
    let db = match init_database(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let stores = open_stores(db);
    let images = Arc::new(FsImageStore::new(&config.image_dir));
    let state = AppState::new(stores, images);

    // Build router
    let app = routes::create_router(state)
        .nest_service("/images", ServeDir::new(&config.image_dir));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server running at http://{}", config.listen_addr);

    axum::serve(listener, app).await.expect("Server error");
}
