use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatwise_cache::presence::PresenceSet;
use seatwise_worker::{slot_maintenance, verifier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatwise_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = seatwise_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    seatwise_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Cache ---
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
    let cache = seatwise_cache::CacheClient::connect(&redis_url)
        .await
        .expect("Failed to connect to Redis");
    tracing::info!("Redis connection established");

    let presence = PresenceSet::new(cache);

    // --- Background loops ---
    let cancel = CancellationToken::new();

    let maintenance_handle = tokio::spawn(slot_maintenance::run(
        pool.clone(),
        slot_maintenance::calendar_from_env(),
        cancel.clone(),
    ));
    let verifier_handle = tokio::spawn(verifier::run(pool.clone(), presence, cancel.clone()));

    tracing::info!("Worker started");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), shutting down");

    cancel.cancel();
    let _ = maintenance_handle.await;
    let _ = verifier_handle.await;

    tracing::info!("Worker stopped");
}
