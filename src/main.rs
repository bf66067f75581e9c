//! arcpay-gateway server entry point.
//!
//! Starts the Axum HTTP server, replays the durable points history into
//! the in-memory accumulator, and schedules leaderboard refreshes.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use arcpay_gateway::api;
use arcpay_gateway::api::session::SessionKeys;
use arcpay_gateway::app_state::AppState;
use arcpay_gateway::config::GatewayConfig;
use arcpay_gateway::domain::{PointsLog, ReferralBook, RewardTable, TaskStore, UserRegistry};
use arcpay_gateway::notify::TelegramNotifier;
use arcpay_gateway::persistence::PostgresPersistence;
use arcpay_gateway::service::{
    LeaderboardReconciler, ReferralService, RegistryMerchantSource, TaskService, UserService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting arcpay-gateway");

    // Connect the write-behind mirror; the gateway serves without it
    let mirror = connect_mirror(&config).await;

    // Build domain layer
    let users = Arc::new(UserRegistry::new());
    let referrals = Arc::new(ReferralBook::new());
    let tasks = Arc::new(TaskStore::new());
    let points = Arc::new(PointsLog::new());

    if let Some(db) = &mirror {
        replay_points_history(db, &points).await;
    }

    // Build outbound Telegram client
    let notifier = Arc::new(TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
        config.telegram_channel_id.clone(),
        Duration::from_secs(config.telegram_timeout_secs),
    )?);

    // Build service layer
    let rewards = RewardTable::default();
    let referral_service = ReferralService::new(
        Arc::clone(&referrals),
        Arc::clone(&points),
        rewards,
        mirror.clone(),
    );
    let user_service = Arc::new(UserService::new(
        Arc::clone(&users),
        Arc::clone(&points),
        referral_service.clone(),
        mirror.clone(),
    ));
    let verifier = Arc::clone(&notifier) as Arc<dyn arcpay_gateway::service::MembershipVerifier>;
    let task_service = Arc::new(TaskService::new(
        tasks,
        Arc::clone(&points),
        referral_service,
        verifier,
        config.quiz_answer_key.clone(),
        mirror,
    ));

    let source = Arc::new(RegistryMerchantSource::new(
        Arc::clone(&users),
        Arc::clone(&points),
        Arc::clone(&referrals),
    ));
    let leaderboard = Arc::new(LeaderboardReconciler::new(
        source,
        config.leaderboard_target_count,
        config.leaderboard_real_only,
    ));
    spawn_leaderboard_refresh(
        Arc::clone(&leaderboard),
        config.leaderboard_refresh_interval_secs,
    );

    // Build application state
    let app_state = AppState {
        user_service,
        task_service,
        leaderboard,
        notifier,
        sessions: SessionKeys::new(&config.session_secret),
        admin_token: config.admin_token.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the PostgreSQL mirror. Connection failure is logged and the
/// gateway runs in-memory only.
async fn connect_mirror(config: &GatewayConfig) -> Option<PostgresPersistence> {
    if !config.persistence_enabled {
        tracing::info!("persistence mirror disabled");
        return None;
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await;

    match pool {
        Ok(pool) => {
            tracing::info!("persistence mirror connected");
            Some(PostgresPersistence::new(pool))
        }
        Err(e) => {
            tracing::warn!(error = %e, "persistence mirror unavailable, running in-memory only");
            None
        }
    }
}

/// Replays the durable points history into the in-memory accumulator.
/// Rows with unrecognized kinds are skipped, not fatal.
async fn replay_points_history(db: &PostgresPersistence, points: &Arc<PointsLog>) {
    match db.load_points_history().await {
        Ok(rows) => {
            let mut restored = 0_usize;
            for row in &rows {
                match PostgresPersistence::row_to_entry(row) {
                    Ok(entry) => {
                        points.restore(entry).await;
                        restored += 1;
                    }
                    Err(e) => {
                        tracing::warn!(row_id = row.id, error = %e, "skipping unreadable points row");
                    }
                }
            }
            tracing::info!(restored, "points history replayed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "points history replay failed, starting empty");
        }
    }
}

/// Schedules the recurring leaderboard refresh.
fn spawn_leaderboard_refresh(leaderboard: Arc<LeaderboardReconciler>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            leaderboard.refresh().await;
        }
    });
}
