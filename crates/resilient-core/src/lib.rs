//! resilient-core: mood journaling and coping-strategy recommendation subsystem.
//!
//! Mood log, strategy catalog, recommendation engine, AI bridge and reminder scheduling,
//! plus the configuration and error types the daemon and host apps share.

pub mod ai_bridge;
mod config;
mod error;
mod hub;
pub mod mood;
pub mod notifications;
pub mod recommendation;
pub mod strategies;

pub use ai_bridge::{
    AiBridge, ChatReply, ChatRequest, ChatTransport, ModelOptions, ModelTier, MoodAnalysis,
    OpenRouterTransport, PendingQuery, QueryId, Readiness,
};
pub use self::config::{ResilienceConfig, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH};
pub use error::{
    AiError, CatalogError, MoodStoreError, NotificationError, ParseError, ResilienceError,
    ResilienceResult, ValidationError,
};
pub use hub::ResilienceHub;
pub use mood::{MemoryRepository, MoodEntry, MoodLog, MoodRepository, MoodStore, SledMoodRepository};
pub use notifications::{
    FeedbackEvent, InMemoryNotificationCenter, NotificationAction, NotificationCenter,
    NotificationRequest, NotificationScheduler, NotificationTrigger, SuggestionKind,
};
pub use recommendation::{
    EngineSettings, Recommendation, RecommendationEngine, RecommendationOutcome,
    RecommendationSource, RequestState,
};
pub use strategies::{Resource, ResourceType, Strategy, StrategyCategory, StrategyLibrary};
