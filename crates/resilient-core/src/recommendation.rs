//! Recommendation engine: turns the mood log into presentable recommendations.
//!
//! Local heuristics are always available. When an AI bridge is attached and ready the
//! engine asks it for a richer analysis and falls back to the local result on error or
//! timeout. Nothing here writes to the mood log.

use crate::ai_bridge::{AiBridge, AiRecommendation, MoodAnalysis};
use crate::error::AiError;
use crate::mood::MoodEntry;
use crate::strategies::{Resource, ResourceType, Strategy, StrategyCategory, StrategyLibrary};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Minimum entries sharing a pattern before it is reported.
const PATTERN_MIN_ENTRIES: usize = 2;

/// Longest look-back the engine honours.
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub trigger_pattern: String,
    /// Always within [0, 1].
    pub confidence_level: f64,
    pub strategies: Vec<Arc<Strategy>>,
    pub resources: Vec<Arc<Resource>>,
}

impl Recommendation {
    pub fn new(title: impl Into<String>, description: impl Into<String>, trigger_pattern: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            trigger_pattern: trigger_pattern.into(),
            confidence_level: 0.0,
            strategies: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_level = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Arc<Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_resources(mut self, resources: Vec<Arc<Resource>>) -> Self {
        self.resources = resources;
        self
    }
}

/// Lifecycle of the most recent refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    AwaitingResponse,
    Resolved,
    Failed(AiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Ai,
    Local,
}

#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<Recommendation>,
    pub source: RecommendationSource,
    /// Set when the AI path failed and the local heuristic was used instead.
    pub error: Option<AiError>,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub window_days: i64,
    pub high_intensity_threshold: u8,
    pub ai_timeout: std::time::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window_days: 7,
            high_intensity_threshold: 4,
            ai_timeout: std::time::Duration::from_secs(30),
        }
    }
}

pub struct RecommendationEngine {
    library: Arc<StrategyLibrary>,
    bridge: Option<AiBridge>,
    settings: EngineSettings,
    state: RwLock<RequestState>,
    /// trigger_pattern -> judgments, oldest first. Stored only; the heuristic does not read it.
    pattern_feedback: DashMap<String, Vec<bool>>,
    /// strategy id -> judgments from notification actions.
    strategy_feedback: DashMap<String, Vec<bool>>,
}

impl RecommendationEngine {
    pub fn new(library: Arc<StrategyLibrary>, settings: EngineSettings) -> Self {
        Self {
            library,
            bridge: None,
            settings,
            state: RwLock::new(RequestState::Idle),
            pattern_feedback: DashMap::new(),
            strategy_feedback: DashMap::new(),
        }
    }

    pub fn with_bridge(mut self, bridge: AiBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn library(&self) -> &Arc<StrategyLibrary> {
        &self.library
    }

    pub fn state(&self) -> RequestState {
        self.state
            .read()
            .map(|g| g.clone())
            .unwrap_or(RequestState::Idle)
    }

    fn set_state(&self, next: RequestState) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
    }

    /// Recomputes recommendations for `entries`, preferring the AI analysis when available.
    pub async fn refresh(&self, entries: &[MoodEntry]) -> RecommendationOutcome {
        self.refresh_at(entries, Utc::now()).await
    }

    pub async fn refresh_at(&self, entries: &[MoodEntry], now: DateTime<Utc>) -> RecommendationOutcome {
        let local = || self.local_recommendations_at(entries, now);

        let Some(bridge) = self.bridge.as_ref().filter(|b| b.is_ready()) else {
            self.set_state(RequestState::Resolved);
            return RecommendationOutcome {
                recommendations: local(),
                source: RecommendationSource::Local,
                error: None,
            };
        };

        self.set_state(RequestState::AwaitingResponse);
        let window = self.window(entries, now);
        let analysis = match tokio::time::timeout(
            self.settings.ai_timeout,
            bridge.analyze_mood_patterns(&window),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AiError::request_failed(format!(
                "analysis timed out after {}s",
                self.settings.ai_timeout.as_secs()
            ))),
        };

        match analysis {
            Ok(MoodAnalysis::Structured(report)) if !report.recommendations.is_empty() => {
                self.set_state(RequestState::Resolved);
                let recs: Vec<Recommendation> = report
                    .recommendations
                    .iter()
                    .map(|r| self.adopt_ai_recommendation(r))
                    .collect();
                tracing::info!(target: "resilient::recommendation", count = recs.len(), "AI recommendations resolved");
                RecommendationOutcome {
                    recommendations: recs,
                    source: RecommendationSource::Ai,
                    error: None,
                }
            }
            Ok(MoodAnalysis::Structured(_)) => {
                self.set_state(RequestState::Resolved);
                RecommendationOutcome {
                    recommendations: local(),
                    source: RecommendationSource::Local,
                    error: None,
                }
            }
            Ok(MoodAnalysis::RawText(text)) => {
                self.set_state(RequestState::Resolved);
                let mut recs = local();
                let strategies = recs.first().map(|r| r.strategies.clone()).unwrap_or_default();
                let insight = Recommendation::new("AI Insight", text, "AI analysis of recent entries")
                    .with_confidence(0.5)
                    .with_strategies(strategies);
                recs.insert(0, insight);
                RecommendationOutcome {
                    recommendations: recs,
                    source: RecommendationSource::Ai,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    target: "resilient::recommendation",
                    error = %e,
                    "AI analysis failed; using local recommendations"
                );
                self.set_state(RequestState::Failed(e.clone()));
                RecommendationOutcome {
                    recommendations: local(),
                    source: RecommendationSource::Local,
                    error: Some(e),
                }
            }
        }
    }

    pub fn local_recommendations(&self, entries: &[MoodEntry]) -> Vec<Recommendation> {
        self.local_recommendations_at(entries, Utc::now())
    }

    /// Keyword/recency/intensity heuristic over the configured window.
    pub fn local_recommendations_at(&self, entries: &[MoodEntry], now: DateTime<Utc>) -> Vec<Recommendation> {
        let window = self.window(entries, now);

        let Some(latest) = window.last() else {
            let strategies = self.library.recommend("", 0, None);
            let resources = self.resources_for(&strategies);
            return vec![Recommendation::new(
                "Build Daily Resilience",
                "Small, regular practices make hard days easier to handle.",
                "No recent mood entries",
            )
            .with_confidence(0.3)
            .with_strategies(strategies)
            .with_resources(resources)];
        };

        let mut recs = Vec::new();

        let strategies = self.library.recommend(
            &latest.mood,
            latest.intensity,
            latest.rejection_trigger.as_deref(),
        );
        let resources = self.resources_for(&strategies);
        let same_mood = window
            .iter()
            .filter(|e| e.mood.eq_ignore_ascii_case(&latest.mood))
            .count();
        recs.push(
            Recommendation::new(
                format!("Support for feeling {}", latest.mood.to_lowercase()),
                format!(
                    "Your latest entry was {} at intensity {}/5. These practices can help right now.",
                    latest.mood.to_lowercase(),
                    latest.intensity
                ),
                format!("Recent {} (intensity {})", latest.mood.to_lowercase(), latest.intensity),
            )
            .with_confidence(confidence(same_mood))
            .with_strategies(strategies)
            .with_resources(resources),
        );

        let rejections: Vec<&MoodEntry> = window.iter().filter(|e| e.is_rejection_related).collect();
        if rejections.len() >= PATTERN_MIN_ENTRIES {
            let trigger = most_frequent(rejections.iter().filter_map(|e| e.rejection_trigger.as_deref()));
            let pattern = match &trigger {
                Some(t) => format!("Rejection related to {} ({} entries)", t, rejections.len()),
                None => format!("Rejection experiences ({} entries)", rejections.len()),
            };
            let mut strategies = self.library.strategies_by_category(StrategyCategory::Cognitive);
            strategies.extend(self.library.strategies_by_category(StrategyCategory::SelfCare));
            let resources = self.resources_for(&strategies);
            recs.push(
                Recommendation::new(
                    "Rejection Resilience",
                    "Rejection has come up several times recently. Reframing it and being kind to yourself can soften its impact.",
                    pattern,
                )
                .with_confidence(confidence(rejections.len()))
                .with_strategies(strategies)
                .with_resources(resources),
            );
        }

        let threshold = self.settings.high_intensity_threshold;
        let mut intense: HashMap<String, usize> = HashMap::new();
        for e in window.iter().filter(|e| e.intensity >= threshold) {
            *intense.entry(e.mood.trim().to_lowercase()).or_default() += 1;
        }
        let recurring = window
            .iter()
            .map(|e| e.mood.trim().to_lowercase())
            .find(|m| intense.get(m).copied().unwrap_or(0) >= PATTERN_MIN_ENTRIES);
        if let Some(mood) = recurring {
            let count = intense[&mood];
            let strategies = self.library.recommend(&mood, threshold, None);
            let resources = self.resources_for(&strategies);
            recs.push(
                Recommendation::new(
                    format!("Recurring intense {}", mood),
                    format!(
                        "You have felt strongly {} {} times recently. A regular practice can lower the peaks.",
                        mood, count
                    ),
                    format!("Repeated high-intensity {} ({} entries)", mood, count),
                )
                .with_confidence(confidence(count))
                .with_strategies(strategies)
                .with_resources(resources),
            );
        }

        tracing::debug!(
            target: "resilient::recommendation",
            window = window.len(),
            count = recs.len(),
            "local recommendations computed"
        );
        recs
    }

    /// Records that `recommendation` helped.
    pub fn mark_helpful(&self, recommendation: &Recommendation) {
        self.record_pattern_feedback(&recommendation.trigger_pattern, true);
    }

    /// Records that `recommendation` did not help.
    pub fn mark_unhelpful(&self, recommendation: &Recommendation) {
        self.record_pattern_feedback(&recommendation.trigger_pattern, false);
    }

    fn record_pattern_feedback(&self, pattern: &str, helpful: bool) {
        self.pattern_feedback
            .entry(pattern.to_string())
            .or_default()
            .push(helpful);
        tracing::debug!(target: "resilient::recommendation", helpful, "recommendation feedback stored");
    }

    /// Feedback arriving from a suggestion notification's HELPFUL / NOT_HELPFUL action.
    pub fn record_strategy_feedback(&self, strategy: &str, helpful: bool) {
        self.strategy_feedback
            .entry(strategy.to_string())
            .or_default()
            .push(helpful);
        tracing::debug!(target: "resilient::recommendation", strategy, helpful, "strategy feedback stored");
    }

    pub fn feedback_for(&self, trigger_pattern: &str) -> Vec<bool> {
        self.pattern_feedback
            .get(trigger_pattern)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn strategy_feedback_for(&self, strategy: &str) -> Vec<bool> {
        self.strategy_feedback
            .get(strategy)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn window(&self, entries: &[MoodEntry], now: DateTime<Utc>) -> Vec<MoodEntry> {
        let days = self.settings.window_days.clamp(0, MAX_WINDOW_DAYS);
        let cutoff = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        entries.iter().filter(|e| e.date >= cutoff).cloned().collect()
    }

    fn resources_for(&self, strategies: &[Arc<Strategy>]) -> Vec<Arc<Resource>> {
        strategies
            .first()
            .map(|s| self.library.resources_for(s.category))
            .unwrap_or_default()
    }

    fn adopt_ai_recommendation(&self, rec: &AiRecommendation) -> Recommendation {
        let strategies = rec
            .strategies
            .iter()
            .enumerate()
            .map(|(i, s)| {
                self.library.find_by_title(&s.title).unwrap_or_else(|| {
                    let mut steps: Vec<String> = s
                        .steps
                        .iter()
                        .map(|step| step.trim().to_string())
                        .filter(|step| !step.is_empty())
                        .collect();
                    if steps.is_empty() {
                        let fallback = if s.description.trim().is_empty() { &s.title } else { &s.description };
                        steps.push(fallback.trim().to_string());
                    }
                    Arc::new(Strategy {
                        id: format!("ai-{}", i + 1),
                        title: s.title.clone(),
                        description: s.description.clone(),
                        category: s
                            .category
                            .as_deref()
                            .map(parse_category)
                            .unwrap_or(StrategyCategory::Mindfulness),
                        time_to_complete: s.time_to_complete.clone().unwrap_or_else(|| "5 min".to_string()),
                        steps,
                        mood_targets: Default::default(),
                    })
                })
            })
            .collect();
        let resources = rec
            .resources
            .iter()
            .map(|r| {
                Arc::new(Resource {
                    title: r.title.clone(),
                    description: r.description.clone(),
                    resource_type: r
                        .resource_type
                        .as_deref()
                        .map(ResourceType::from_label)
                        .unwrap_or(ResourceType::Article),
                    url: r.url.clone().filter(|u| !u.trim().is_empty()),
                })
            })
            .collect();

        Recommendation::new(&rec.title, &rec.description, &rec.trigger_pattern)
            .with_confidence(rec.confidence_level)
            .with_strategies(strategies)
            .with_resources(resources)
    }
}

fn confidence(supporting: usize) -> f64 {
    (0.4 + 0.1 * supporting as f64).min(1.0)
}

fn most_frequent<'a>(items: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        let key = item.trim().to_lowercase();
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    // First-seen wins ties.
    let mut best: Option<(String, usize)> = None;
    for (k, n) in counts {
        if best.as_ref().map(|(_, b)| n > *b).unwrap_or(true) {
            best = Some((k, n));
        }
    }
    best.map(|(k, _)| k)
}

fn parse_category(raw: &str) -> StrategyCategory {
    match raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
        "cognitive" => StrategyCategory::Cognitive,
        "physical" => StrategyCategory::Physical,
        "social" => StrategyCategory::Social,
        "creative" => StrategyCategory::Creative,
        "selfcare" => StrategyCategory::SelfCare,
        _ => StrategyCategory::Mindfulness,
    }
}
