//! Wires the mood log, recommendation engine and scheduler together.
//!
//! Data flows one way: a logged entry triggers a recommendation refresh and a suggestion.
//! Feedback from notification actions flows back into the engine's feedback store only.

use crate::error::ResilienceResult;
use crate::mood::{MoodEntry, MoodStore};
use crate::notifications::NotificationScheduler;
use crate::recommendation::{Recommendation, RecommendationEngine, RecommendationOutcome};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

pub struct ResilienceHub {
    store: Arc<MoodStore>,
    engine: Arc<RecommendationEngine>,
    scheduler: Arc<NotificationScheduler>,
    current: RwLock<Vec<Recommendation>>,
}

impl ResilienceHub {
    pub fn new(
        store: Arc<MoodStore>,
        engine: Arc<RecommendationEngine>,
        scheduler: Arc<NotificationScheduler>,
    ) -> Self {
        Self {
            store,
            engine,
            scheduler,
            current: RwLock::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<MoodStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<RecommendationEngine> {
        &self.engine
    }

    pub fn scheduler(&self) -> &Arc<NotificationScheduler> {
        &self.scheduler
    }

    /// Appends `entry`, refreshes recommendations and schedules a follow-up suggestion.
    /// A rejected entry leaves everything untouched. Scheduling failures are logged only.
    pub async fn log_mood(&self, entry: MoodEntry) -> ResilienceResult<RecommendationOutcome> {
        self.store.add_entry(entry)?;
        let outcome = self.refresh().await;

        let entries = self.store.all_entries();
        if let Err(e) = self
            .scheduler
            .schedule_context_aware_suggestion(&entries, None)
            .await
        {
            tracing::warn!(target: "resilient::hub", error = %e, "suggestion not scheduled");
        }
        Ok(outcome)
    }

    /// Recomputes recommendations from the whole log and keeps them as the current set.
    pub async fn refresh(&self) -> RecommendationOutcome {
        let entries = self.store.all_entries();
        let outcome = self.engine.refresh(&entries).await;
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = outcome.recommendations.clone();
        outcome
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.current
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Forwards HELPFUL / NOT_HELPFUL notification answers into the engine until the
    /// scheduler goes away.
    pub fn spawn_feedback_forwarder(&self) -> JoinHandle<()> {
        let mut rx = self.scheduler.subscribe_feedback();
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => engine.record_strategy_feedback(&event.strategy, event.was_helpful),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(target: "resilient::hub", skipped, "feedback events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
