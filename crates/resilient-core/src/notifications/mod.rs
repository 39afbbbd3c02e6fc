//! Reminder and suggestion scheduling on top of the local notification center.

mod center;

pub use center::{
    default_categories, InMemoryNotificationCenter, NotificationAction, NotificationCategory,
    NotificationCenter, NotificationContent, NotificationRequest, NotificationTrigger,
    COPING_SUGGESTION_CATEGORY, DEFAULT_PENDING_LIMIT, MOOD_REMINDER_CATEGORY,
};

use crate::error::NotificationError;
use crate::mood::MoodEntry;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub const DAILY_REMINDER_ID: &str = "daily-mood-reminder";
pub const REMIND_LATER_DELAY_HOURS: i64 = 3;

pub const STRATEGY_TYPE_KEY: &str = "strategyType";
pub const MOOD_TRIGGER_KEY: &str = "moodTrigger";

// Unreachable with 1-5 intensities; kept to match the shipped behaviour.
const ANXIETY_INTENSITY_THRESHOLD: u8 = 6;
const SADNESS_INTENSITY_THRESHOLD: u8 = 5;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Emitted when the user answers a suggestion with HELPFUL or NOT_HELPFUL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub strategy: String,
    pub was_helpful: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Anxiety,
    Sadness,
    General,
}

impl SuggestionKind {
    fn title(self) -> &'static str {
        match self {
            SuggestionKind::Anxiety => "A moment to breathe",
            SuggestionKind::Sadness => "Be gentle with yourself",
            SuggestionKind::General => "Build your resilience",
        }
    }

    fn body(self) -> &'static str {
        match self {
            SuggestionKind::Anxiety => {
                "You've been feeling anxious today. Try a few minutes of box breathing to settle your body."
            }
            SuggestionKind::Sadness => {
                "Today has been heavy. A short self-compassion break might help you feel a little lighter."
            }
            SuggestionKind::General => {
                "A small daily practice goes a long way. Take a minute for yourself and check in with how you feel."
            }
        }
    }

    pub fn strategy_type(self) -> &'static str {
        match self {
            SuggestionKind::Anxiety => "anxiety_relief",
            SuggestionKind::Sadness => "mood_lifting",
            SuggestionKind::General => "resilience_building",
        }
    }

    fn mood_trigger(self) -> &'static str {
        match self {
            SuggestionKind::Anxiety => "anxiety",
            SuggestionKind::Sadness => "sadness",
            SuggestionKind::General => "general",
        }
    }
}

/// Picks the message family from today's entries.
pub fn select_suggestion(entries: &[MoodEntry], now: DateTime<Local>) -> SuggestionKind {
    let today = now.date_naive();
    let todays: Vec<&MoodEntry> = entries
        .iter()
        .filter(|e| e.date.with_timezone(&Local).date_naive() == today)
        .collect();

    let matches = |needle: &str, threshold: u8| {
        todays
            .iter()
            .any(|e| e.mood.to_lowercase().contains(needle) && e.intensity > threshold)
    };

    if matches("anxiety", ANXIETY_INTENSITY_THRESHOLD) {
        SuggestionKind::Anxiety
    } else if matches("sad", SADNESS_INTENSITY_THRESHOLD) {
        SuggestionKind::Sadness
    } else {
        SuggestionKind::General
    }
}

/// Fixed time-of-day table used when the user has no preferred times.
pub fn default_delivery_time(now: DateTime<Local>) -> NaiveTime {
    // 21:00-05:59 evening, 07:00-09:00 inclusive morning.
    let (hour, minute) = match (now.hour(), now.minute()) {
        (h, _) if h >= 21 || h < 6 => (21, 30),
        (7 | 8, _) | (9, 0) => (8, 15),
        _ => (12, 30),
    };
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Next local instant strictly after `now` whose wall clock reads `time`.
pub fn next_occurrence(now: DateTime<Local>, time: NaiveTime) -> Result<DateTime<Local>, NotificationError> {
    let invalid = || NotificationError::InvalidTime {
        hour: time.hour(),
        minute: time.minute(),
    };
    let today = now.date_naive().and_time(time);
    let candidate = Local.from_local_datetime(&today).earliest().ok_or_else(invalid)?;
    if candidate > now {
        return Ok(candidate);
    }
    let tomorrow = today + Duration::days(1);
    Local.from_local_datetime(&tomorrow).earliest().ok_or_else(invalid)
}

pub struct NotificationScheduler {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    feedback_tx: broadcast::Sender<FeedbackEvent>,
}

impl NotificationScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        Self::with_clock(center, Arc::new(SystemClock))
    }

    pub fn with_clock(center: Arc<dyn NotificationCenter>, clock: Arc<dyn Clock>) -> Self {
        let (feedback_tx, _) = broadcast::channel(64);
        Self {
            center,
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
            feedback_tx,
        }
    }

    /// Deterministic choice among preferred times.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn subscribe_feedback(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.feedback_tx.subscribe()
    }

    pub async fn register_categories(&self) {
        self.center.register_categories(default_categories()).await;
    }

    /// Daily mood check-in. Re-scheduling replaces the previous reminder.
    pub async fn schedule_daily_reminder(&self, hour: u32, minute: u32) -> Result<(), NotificationError> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or(NotificationError::InvalidTime { hour, minute })?;
        let request = NotificationRequest {
            identifier: DAILY_REMINDER_ID.to_string(),
            content: NotificationContent {
                title: "How are you feeling today?".to_string(),
                body: "Take a moment to log your mood and check in with yourself.".to_string(),
                category: MOOD_REMINDER_CATEGORY.to_string(),
                user_info: BTreeMap::new(),
            },
            trigger: NotificationTrigger::Daily(time),
        };
        self.center.add(request).await?;
        tracing::info!(target: "resilient::notifications", hour, minute, "daily reminder scheduled");
        Ok(())
    }

    /// Schedules one suggestion based on today's entries. Returns the request identifier,
    /// or `None` when there is nothing to base a suggestion on.
    pub async fn schedule_context_aware_suggestion(
        &self,
        entries: &[MoodEntry],
        preferred_times: Option<&[NaiveTime]>,
    ) -> Result<Option<String>, NotificationError> {
        if entries.is_empty() {
            return Ok(None);
        }

        let now = self.clock.now();
        let kind = select_suggestion(entries, now);

        let time = match preferred_times.filter(|t| !t.is_empty()) {
            Some(times) => {
                let mut rng = self
                    .rng
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                times.choose(&mut *rng).copied().unwrap_or_else(|| default_delivery_time(now))
            }
            None => default_delivery_time(now),
        };
        let fire_at = next_occurrence(now, time)?;

        let mut user_info = BTreeMap::new();
        user_info.insert(STRATEGY_TYPE_KEY.to_string(), kind.strategy_type().to_string());
        user_info.insert(MOOD_TRIGGER_KEY.to_string(), kind.mood_trigger().to_string());

        let identifier = format!("context-suggestion-{}", uuid::Uuid::new_v4());
        let request = NotificationRequest {
            identifier: identifier.clone(),
            content: NotificationContent {
                title: kind.title().to_string(),
                body: kind.body().to_string(),
                category: COPING_SUGGESTION_CATEGORY.to_string(),
                user_info,
            },
            trigger: NotificationTrigger::At(fire_at),
        };
        self.center.add(request).await?;

        tracing::info!(
            target: "resilient::notifications",
            kind = kind.strategy_type(),
            fire_at = %fire_at,
            "context-aware suggestion scheduled"
        );
        Ok(Some(identifier))
    }

    /// Follow-up for a delivered suggestion. REMIND_LATER re-schedules the same content three
    /// hours out; HELPFUL / NOT_HELPFUL broadcast a feedback event and return it.
    pub async fn handle_action(
        &self,
        delivered: &NotificationRequest,
        action: NotificationAction,
    ) -> Result<Option<FeedbackEvent>, NotificationError> {
        let strategy = delivered
            .content
            .user_info
            .get(STRATEGY_TYPE_KEY)
            .cloned()
            .unwrap_or_else(|| delivered.identifier.clone());

        match action {
            NotificationAction::RemindLater => {
                let fire_at = self.clock.now() + Duration::hours(REMIND_LATER_DELAY_HOURS);
                let request = NotificationRequest {
                    identifier: format!("{}-later-{}", strategy, uuid::Uuid::new_v4()),
                    content: delivered.content.clone(),
                    trigger: NotificationTrigger::At(fire_at),
                };
                self.center.add(request).await?;
                tracing::debug!(target: "resilient::notifications", strategy = %strategy, "suggestion snoozed");
                Ok(None)
            }
            NotificationAction::Helpful | NotificationAction::NotHelpful => {
                let event = FeedbackEvent {
                    strategy,
                    was_helpful: action == NotificationAction::Helpful,
                };
                // No subscribers is fine; the event is also returned to the caller.
                let _ = self.feedback_tx.send(event.clone());
                Ok(Some(event))
            }
            NotificationAction::View | NotificationAction::Dismiss => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn local(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 12, h, m, 0).single().unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn time_of_day_table() {
        assert_eq!(default_delivery_time(local(22, 0)), t(21, 30));
        assert_eq!(default_delivery_time(local(3, 0)), t(21, 30));
        assert_eq!(default_delivery_time(local(6, 30)), t(12, 30));
        assert_eq!(default_delivery_time(local(8, 0)), t(8, 15));
        assert_eq!(default_delivery_time(local(7, 0)), t(8, 15));
        assert_eq!(default_delivery_time(local(9, 0)), t(8, 15));
        assert_eq!(default_delivery_time(local(9, 1)), t(12, 30));
        assert_eq!(default_delivery_time(local(9, 30)), t(12, 30));
        assert_eq!(default_delivery_time(local(15, 0)), t(12, 30));
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow() {
        let now = local(13, 0);
        assert_eq!(next_occurrence(now, t(21, 30)).unwrap(), local(21, 30));
        assert_eq!(
            next_occurrence(now, t(12, 30)).unwrap(),
            local(12, 30) + Duration::days(1)
        );
    }

    #[test]
    fn intensity_thresholds_are_unreachable_for_valid_entries() {
        let now = local(14, 0);
        let entries = vec![
            MoodEntry::new("anxiety attack", 5).at(now.with_timezone(&Utc)),
            MoodEntry::new("sad", 5).at(now.with_timezone(&Utc)),
        ];
        assert_eq!(select_suggestion(&entries, now), SuggestionKind::General);
    }

    #[test]
    fn thresholds_apply_when_exceeded() {
        let now = local(14, 0);
        let mut anxious = MoodEntry::new("Anxiety", 5).at(now.with_timezone(&Utc));
        anxious.intensity = 7;
        let mut sad = MoodEntry::new("so sad", 5).at(now.with_timezone(&Utc));
        sad.intensity = 6;
        assert_eq!(select_suggestion(&[sad.clone(), anxious], now), SuggestionKind::Anxiety);
        assert_eq!(select_suggestion(&[sad.clone()], now), SuggestionKind::Sadness);

        let yesterday = now - Duration::days(1);
        sad.date = yesterday.with_timezone(&Utc);
        assert_eq!(select_suggestion(&[sad], now), SuggestionKind::General);
    }
}
