//! ProjectHub API server
//!
//! User registration/login with JWT issuance plus role-gated project CRUD,
//! behind an API-key and rate-limit gate.

use anyhow::{Context, Result};
use dotenv::dotenv;
use projecthub_backend::app::{build_router, AppConfig, AppState};
use projecthub_backend::auth::{JwtHandler, UserStore};
use projecthub_backend::middleware::{RateLimitConfig, RateLimitLayer};
use projecthub_backend::projects::ProjectStore;
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("ProjectHub API starting");

    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "projecthub.db".to_string());
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
    let api_key = env::var("API_KEY").unwrap_or_else(|_| "dev-api-key".to_string());

    let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "*".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let rate_limit_per_minute = env::var("RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(5);

    let users = Arc::new(UserStore::new(&db_path)?);
    let projects = Arc::new(ProjectStore::new(&db_path)?);
    let jwt = Arc::new(JwtHandler::new(jwt_secret));

    info!("Database initialized at: {}", db_path);

    let state = AppState {
        users,
        projects,
        jwt,
    };

    let config = AppConfig {
        api_key,
        allowed_origins,
        rate_limit: RateLimitConfig {
            max_requests: rate_limit_per_minute,
            window: Duration::from_secs(60),
        },
    };

    let limiter = RateLimitLayer::new(config.rate_limit.clone());

    // Sweep stale per-IP counters in the background.
    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(300)).await;
            cleanup_limiter.cleanup();
        }
    });

    let app = build_router(state, &config, limiter);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter support
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projecthub_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the manifest-dir .env (common when running with --manifest-path)
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
