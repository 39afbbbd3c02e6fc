//! Local notification boundary: requests, triggers, categories and the platform trait.

use crate::error::NotificationError;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Pending-request ceiling most mobile platforms enforce.
pub const DEFAULT_PENDING_LIMIT: usize = 64;

pub const MOOD_REMINDER_CATEGORY: &str = "MOOD_REMINDER";
pub const COPING_SUGGESTION_CATEGORY: &str = "COPING_SUGGESTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationAction {
    View,
    Dismiss,
    Helpful,
    NotHelpful,
    RemindLater,
}

impl NotificationAction {
    pub fn identifier(self) -> &'static str {
        match self {
            NotificationAction::View => "VIEW",
            NotificationAction::Dismiss => "DISMISS",
            NotificationAction::Helpful => "HELPFUL",
            NotificationAction::NotHelpful => "NOT_HELPFUL",
            NotificationAction::RemindLater => "REMIND_LATER",
        }
    }

    pub fn from_identifier(raw: &str) -> Option<Self> {
        match raw {
            "VIEW" => Some(NotificationAction::View),
            "DISMISS" => Some(NotificationAction::Dismiss),
            "HELPFUL" => Some(NotificationAction::Helpful),
            "NOT_HELPFUL" => Some(NotificationAction::NotHelpful),
            "REMIND_LATER" => Some(NotificationAction::RemindLater),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCategory {
    pub identifier: String,
    pub actions: Vec<NotificationAction>,
}

/// The two categories the app registers at startup.
pub fn default_categories() -> Vec<NotificationCategory> {
    vec![
        NotificationCategory {
            identifier: MOOD_REMINDER_CATEGORY.to_string(),
            actions: vec![NotificationAction::View, NotificationAction::Dismiss],
        },
        NotificationCategory {
            identifier: COPING_SUGGESTION_CATEGORY.to_string(),
            actions: vec![
                NotificationAction::Helpful,
                NotificationAction::NotHelpful,
                NotificationAction::RemindLater,
            ],
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTrigger {
    /// Repeats every day at the given local wall-clock time.
    Daily(NaiveTime),
    /// Fires once.
    At(DateTime<Local>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub category: String,
    pub user_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Platform notification service. Registering a request with an existing identifier replaces it.
#[async_trait::async_trait]
pub trait NotificationCenter: Send + Sync {
    async fn register_categories(&self, categories: Vec<NotificationCategory>);

    async fn add(&self, request: NotificationRequest) -> Result<(), NotificationError>;

    async fn remove_pending(&self, identifiers: &[String]);

    async fn pending(&self) -> Vec<NotificationRequest>;
}

#[derive(Default)]
struct CenterState {
    categories: Vec<NotificationCategory>,
    pending: Vec<NotificationRequest>,
    /// Daily identifier -> last local date it was delivered.
    delivered_daily: HashMap<String, NaiveDate>,
}

/// In-process notification center. Used by the daemon and in tests.
pub struct InMemoryNotificationCenter {
    state: Mutex<CenterState>,
    add_calls: AtomicUsize,
    pending_limit: usize,
}

impl InMemoryNotificationCenter {
    pub fn new() -> Self {
        Self::with_pending_limit(DEFAULT_PENDING_LIMIT)
    }

    pub fn with_pending_limit(pending_limit: usize) -> Self {
        Self {
            state: Mutex::new(CenterState::default()),
            add_calls: AtomicUsize::new(0),
            pending_limit,
        }
    }

    /// Number of `add` calls received, accepted or not.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        self.lock().categories.clone()
    }

    /// Removes and returns one-shot requests that are due, plus daily requests whose time
    /// has passed today and which have not been delivered yet today.
    pub fn take_due(&self, now: DateTime<Local>) -> Vec<NotificationRequest> {
        let mut state = self.lock();
        let today = now.date_naive();
        let now_time = NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second())
            .unwrap_or(NaiveTime::MIN);

        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(state.pending.len());
        let pending = std::mem::take(&mut state.pending);
        for request in pending {
            match &request.trigger {
                NotificationTrigger::At(when) if *when <= now => due.push(request),
                NotificationTrigger::Daily(time) if *time <= now_time => {
                    let delivered_today = state
                        .delivered_daily
                        .get(&request.identifier)
                        .map(|d| *d == today)
                        .unwrap_or(false);
                    if !delivered_today {
                        state.delivered_daily.insert(request.identifier.clone(), today);
                        due.push(request.clone());
                    }
                    keep.push(request);
                }
                _ => keep.push(request),
            }
        }
        state.pending = keep;
        due
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CenterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationCenter for InMemoryNotificationCenter {
    async fn register_categories(&self, categories: Vec<NotificationCategory>) {
        self.lock().categories = categories;
    }

    async fn add(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(existing) = state
            .pending
            .iter_mut()
            .find(|r| r.identifier == request.identifier)
        {
            *existing = request;
            return Ok(());
        }
        if state.pending.len() >= self.pending_limit {
            return Err(NotificationError::Rejected {
                identifier: request.identifier,
                reason: format!("pending limit of {} reached", self.pending_limit),
            });
        }
        state.pending.push(request);
        Ok(())
    }

    async fn remove_pending(&self, identifiers: &[String]) {
        self.lock()
            .pending
            .retain(|r| !identifiers.contains(&r.identifier));
    }

    async fn pending(&self) -> Vec<NotificationRequest> {
        self.lock().pending.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request(id: &str, trigger: NotificationTrigger) -> NotificationRequest {
        NotificationRequest {
            identifier: id.to_string(),
            content: NotificationContent {
                title: "t".to_string(),
                body: "b".to_string(),
                category: MOOD_REMINDER_CATEGORY.to_string(),
                user_info: BTreeMap::new(),
            },
            trigger,
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 12, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn action_identifiers_roundtrip() {
        for action in [
            NotificationAction::View,
            NotificationAction::Dismiss,
            NotificationAction::Helpful,
            NotificationAction::NotHelpful,
            NotificationAction::RemindLater,
        ] {
            assert_eq!(NotificationAction::from_identifier(action.identifier()), Some(action));
        }
        assert_eq!(NotificationAction::from_identifier("SNOOZE"), None);
    }

    #[tokio::test]
    async fn same_identifier_replaces() {
        let center = InMemoryNotificationCenter::new();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        center.add(request("daily", NotificationTrigger::Daily(nine))).await.unwrap();
        center.add(request("daily", NotificationTrigger::Daily(ten))).await.unwrap();
        let pending = center.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].trigger, NotificationTrigger::Daily(ten));
        assert_eq!(center.add_calls(), 2);
    }

    #[tokio::test]
    async fn limit_rejects_new_requests() {
        let center = InMemoryNotificationCenter::with_pending_limit(1);
        center.add(request("a", NotificationTrigger::At(noon()))).await.unwrap();
        let err = center
            .add(request("b", NotificationTrigger::At(noon())))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Rejected { identifier, .. } if identifier == "b"));
    }

    #[tokio::test]
    async fn take_due_delivers_daily_once_per_day() {
        let center = InMemoryNotificationCenter::new();
        let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        center.add(request("daily", NotificationTrigger::Daily(eleven))).await.unwrap();
        center
            .add(request("later", NotificationTrigger::At(noon() + Duration::hours(3))))
            .await
            .unwrap();
        center
            .add(request("now", NotificationTrigger::At(noon() - Duration::minutes(1))))
            .await
            .unwrap();

        let due: Vec<String> = center.take_due(noon()).into_iter().map(|r| r.identifier).collect();
        assert_eq!(due, vec!["daily", "now"]);
        assert!(center.take_due(noon()).is_empty());

        let remaining: Vec<String> = center.pending().await.into_iter().map(|r| r.identifier).collect();
        assert_eq!(remaining, vec!["daily", "later"]);

        let tomorrow = noon() + Duration::days(1);
        let due: Vec<String> = center.take_due(tomorrow).into_iter().map(|r| r.identifier).collect();
        assert_eq!(due, vec!["daily", "later"]);
    }
}
