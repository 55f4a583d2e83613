use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use auth_cell::services::password::hash_password;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // `care-pro-api hash-password <password>` prints a line for the operators file
    let args: Vec<String> = std::env::args().collect();
    if let [_, command, password] = args.as_slice() {
        if command == "hash-password" {
            let hash = hash_password(password)
                .map_err(|e| anyhow::anyhow!("could not hash password: {}", e))?;
            println!("{}", hash);
            return Ok(());
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Care-Pro booking API server");

    // Load configuration
    let mut config = AppConfig::from_env();
    if let Ok(dir) = std::env::var("CARE_PRO_DATA_DIR") {
        info!("Using data directory {}", dir);
        config = config.with_data_dir(dir);
    }
    info!(
        "Schedule: {}, ledger: {}",
        config.schedule_file.display(),
        config.appointments_file.display()
    );

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let addr = config.bind_addr.clone();
    let state = Arc::new(config);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
