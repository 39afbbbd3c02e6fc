//! Integration test: reminder and suggestion scheduling against the in-memory center.
//!
//! ## Scenario
//! 1. Register categories and the daily reminder.
//! 2. Schedule a context-aware suggestion from today's entries.
//! 3. Answer it with REMIND_LATER, then HELPFUL.
//! 4. **Confirm** the snoozed copy fires three hours later and feedback reaches the engine.

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};
use resilient_core::notifications::{
    FixedClock, COPING_SUGGESTION_CATEGORY, DAILY_REMINDER_ID, MOOD_REMINDER_CATEGORY,
    STRATEGY_TYPE_KEY,
};
use resilient_core::{
    EngineSettings, InMemoryNotificationCenter, MoodEntry, MoodStore, NotificationAction,
    NotificationCenter, NotificationError, NotificationScheduler, NotificationTrigger,
    RecommendationEngine, ResilienceHub, StrategyLibrary,
};
use std::sync::Arc;

fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 10, h, m, 0).single().unwrap()
}

fn scheduler_at(now: DateTime<Local>) -> (Arc<InMemoryNotificationCenter>, NotificationScheduler) {
    let center = Arc::new(InMemoryNotificationCenter::new());
    let scheduler = NotificationScheduler::with_clock(center.clone(), Arc::new(FixedClock(now)));
    (center, scheduler)
}

#[tokio::test]
async fn empty_entries_schedule_nothing() {
    let (center, scheduler) = scheduler_at(at(14, 0));
    let scheduled = scheduler.schedule_context_aware_suggestion(&[], None).await.unwrap();
    assert!(scheduled.is_none());
    assert_eq!(center.add_calls(), 0);
    assert!(center.pending().await.is_empty());
}

#[tokio::test]
async fn categories_and_daily_reminder() {
    let (center, scheduler) = scheduler_at(at(8, 0));
    scheduler.register_categories().await;
    let categories = center.categories();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].identifier, MOOD_REMINDER_CATEGORY);
    assert_eq!(
        categories[1].actions,
        vec![
            NotificationAction::Helpful,
            NotificationAction::NotHelpful,
            NotificationAction::RemindLater
        ]
    );

    scheduler.schedule_daily_reminder(20, 0).await.unwrap();
    scheduler.schedule_daily_reminder(21, 15).await.unwrap();
    let pending = center.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].identifier, DAILY_REMINDER_ID);
    assert_eq!(
        pending[0].trigger,
        NotificationTrigger::Daily(NaiveTime::from_hms_opt(21, 15, 0).unwrap())
    );

    let err = scheduler.schedule_daily_reminder(24, 0).await.unwrap_err();
    assert_eq!(err, NotificationError::InvalidTime { hour: 24, minute: 0 });
}

#[tokio::test]
async fn suggestion_uses_time_of_day_table() {
    let now = at(8, 0);
    let (center, scheduler) = scheduler_at(now);
    let entries = vec![MoodEntry::new("anxiety", 5).at(now.with_timezone(&Utc))];

    let id = scheduler
        .schedule_context_aware_suggestion(&entries, None)
        .await
        .unwrap()
        .unwrap();
    let pending = center.pending().await;
    let request = pending.iter().find(|r| r.identifier == id).unwrap();
    assert_eq!(request.content.category, COPING_SUGGESTION_CATEGORY);
    // Intensity 5 never exceeds the anxiety threshold.
    assert_eq!(
        request.content.user_info.get(STRATEGY_TYPE_KEY).map(String::as_str),
        Some("resilience_building")
    );
    assert_eq!(request.trigger, NotificationTrigger::At(at(8, 15)));
}

#[tokio::test]
async fn preferred_times_are_honoured() {
    let now = at(13, 0);
    let (center, scheduler) = scheduler_at(now);
    let scheduler = scheduler.with_seed(7);
    let preferred = [NaiveTime::from_hms_opt(18, 45, 0).unwrap()];
    let entries = vec![MoodEntry::new("tired", 2).at(now.with_timezone(&Utc))];

    scheduler
        .schedule_context_aware_suggestion(&entries, Some(&preferred))
        .await
        .unwrap();
    assert_eq!(center.pending().await[0].trigger, NotificationTrigger::At(at(18, 45)));
}

#[tokio::test]
async fn remind_later_and_feedback_flow_into_engine() {
    let now = at(22, 0);
    let (center, scheduler) = scheduler_at(now);
    let scheduler = Arc::new(scheduler);

    let store = Arc::new(MoodStore::new());
    let engine = Arc::new(RecommendationEngine::new(
        Arc::new(StrategyLibrary::builtin()),
        EngineSettings::default(),
    ));
    let hub = ResilienceHub::new(Arc::clone(&store), Arc::clone(&engine), Arc::clone(&scheduler));
    let forwarder = hub.spawn_feedback_forwarder();

    hub.log_mood(MoodEntry::new("lonely", 3).at(now.with_timezone(&Utc)))
        .await
        .unwrap();
    let pending = center.pending().await;
    assert_eq!(pending.len(), 1);
    let suggestion = pending[0].clone();
    assert_eq!(suggestion.trigger, NotificationTrigger::At(at(21, 30) + Duration::days(1)));

    let snoozed = scheduler
        .handle_action(&suggestion, NotificationAction::RemindLater)
        .await
        .unwrap();
    assert!(snoozed.is_none());
    let pending = center.pending().await;
    assert_eq!(pending.len(), 2);
    let copy = &pending[1];
    assert_eq!(copy.content, suggestion.content);
    assert_eq!(copy.trigger, NotificationTrigger::At(now + Duration::hours(3)));

    let mut feedback = scheduler.subscribe_feedback();
    let event = scheduler
        .handle_action(&suggestion, NotificationAction::Helpful)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.strategy, "resilience_building");
    assert!(event.was_helpful);
    assert_eq!(feedback.recv().await.unwrap(), event);

    // Let the forwarder drain the broadcast.
    for _ in 0..50 {
        if !engine.strategy_feedback_for("resilience_building").is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(engine.strategy_feedback_for("resilience_building"), vec![true]);
    forwarder.abort();
}

#[tokio::test]
async fn rejected_entry_schedules_nothing() {
    let (center, scheduler) = scheduler_at(at(12, 0));
    let hub = ResilienceHub::new(
        Arc::new(MoodStore::new()),
        Arc::new(RecommendationEngine::new(
            Arc::new(StrategyLibrary::builtin()),
            EngineSettings::default(),
        )),
        Arc::new(scheduler),
    );
    assert!(hub.log_mood(MoodEntry::new("sad", 9)).await.is_err());
    assert_eq!(center.add_calls(), 0);
    assert!(hub.recommendations().is_empty());
}
