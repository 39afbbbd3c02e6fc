//! Resilience reminder daemon.
//!
//! Opens the persistent mood log, keeps recommendations fresh, registers the daily
//! check-in reminder and delivers due notifications on every tick.

use chrono::{Local, NaiveDate};
use resilient_core::{
    AiBridge, InMemoryNotificationCenter, MoodStore, NotificationScheduler, OpenRouterTransport,
    RecommendationEngine, RecommendationSource, ResilienceConfig, ResilienceHub, SledMoodRepository,
    StrategyLibrary,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type DaemonResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> DaemonResult<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[resilient-daemon] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ResilienceConfig::load()?;

    let library = Arc::new(match &config.strategy_catalog_path {
        Some(path) => StrategyLibrary::load_toml(Path::new(path))?,
        None => StrategyLibrary::builtin(),
    });

    let repository = Arc::new(SledMoodRepository::open_path(config.mood_db_path())?);
    let store = Arc::new(MoodStore::with_repository(repository)?);

    let mut engine = RecommendationEngine::new(Arc::clone(&library), config.engine_settings());
    let bridge = match ResilienceConfig::api_key() {
        Some(key) => {
            let transport = OpenRouterTransport::new(key).with_api_base(&config.ai_api_url);
            let bridge = AiBridge::new(Arc::new(transport))
                .with_models(&config.ai_light_model, &config.ai_capable_model);
            if bridge.initialize().await {
                engine = engine.with_bridge(bridge.clone());
            }
            Some(bridge)
        }
        None => {
            tracing::info!("no AI API key set; using local recommendations only");
            None
        }
    };

    let center = Arc::new(InMemoryNotificationCenter::new());
    let scheduler = Arc::new(NotificationScheduler::new(center.clone()));
    scheduler.register_categories().await;
    scheduler
        .schedule_daily_reminder(config.daily_reminder_hour, config.daily_reminder_minute)
        .await?;

    let hub = ResilienceHub::new(Arc::clone(&store), Arc::new(engine), scheduler);
    let forwarder = hub.spawn_feedback_forwarder();

    tracing::info!(
        tick_rate_secs = config.tick_rate().as_secs(),
        storage_path = %config.storage_path,
        entries = store.len(),
        strategies = library.len(),
        "resilient daemon started"
    );

    let mut interval = tokio::time::interval(config.tick_rate());
    let mut last_suggestion: Option<NaiveDate> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = tick(&hub, &center, &mut last_suggestion).await {
                    tracing::warn!(error = %e, "daemon tick failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down daemon");
                break;
            }
        }
    }

    if let Some(bridge) = bridge {
        bridge.fail_all_pending("daemon shutting down");
    }
    forwarder.abort();
    Ok(())
}

async fn tick(
    hub: &ResilienceHub,
    center: &InMemoryNotificationCenter,
    last_suggestion: &mut Option<NaiveDate>,
) -> DaemonResult<()> {
    let now = Local::now();

    for request in center.take_due(now) {
        tracing::info!(
            identifier = %request.identifier,
            category = %request.content.category,
            title = %request.content.title,
            "notification delivered"
        );
    }

    let outcome = hub.refresh().await;
    if outcome.source == RecommendationSource::Local {
        if let Some(e) = &outcome.error {
            tracing::debug!(error = %e, "AI unavailable this tick");
        }
    }
    tracing::debug!(count = outcome.recommendations.len(), "recommendations refreshed");

    let today = now.date_naive();
    if *last_suggestion != Some(today) {
        let entries = hub.store().all_entries();
        if let Some(id) = hub
            .scheduler()
            .schedule_context_aware_suggestion(&entries, None)
            .await?
        {
            tracing::info!(identifier = %id, "daily suggestion scheduled");
            *last_suggestion = Some(today);
        }
    }
    Ok(())
}
