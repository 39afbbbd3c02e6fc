//! Coping strategy library: a read-only catalog built once and shared by `Arc`.
//!
//! There is deliberately no global instance. The hub (or a test) constructs the catalog
//! and hands clones of the `Arc` to the recommendation engine and scheduler.

mod catalog;
mod resources;

pub use resources::{Resource, ResourceType};

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Mood keywords that switch `recommend` to the calming categories.
pub const NEGATIVE_AFFECT_KEYWORDS: [&str; 5] = ["sad", "angry", "frustrated", "anxious", "stressed"];

/// Number of catalog entries returned when no negative keyword matches.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyCategory {
    Mindfulness,
    Cognitive,
    Physical,
    Social,
    Creative,
    SelfCare,
}

impl StrategyCategory {
    pub fn label(self) -> &'static str {
        match self {
            StrategyCategory::Mindfulness => "Mindfulness",
            StrategyCategory::Cognitive => "Cognitive",
            StrategyCategory::Physical => "Physical",
            StrategyCategory::Social => "Social",
            StrategyCategory::Creative => "Creative",
            StrategyCategory::SelfCare => "Self-Care",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: StrategyCategory,
    /// Display string, e.g. "5 min".
    pub time_to_complete: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub mood_targets: BTreeSet<String>,
}

impl Strategy {
    pub fn targets_mood(&self, mood: &str) -> bool {
        let mood = mood.trim().to_lowercase();
        self.mood_targets.iter().any(|t| mood.contains(t.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    strategies: Vec<Strategy>,
    #[serde(default)]
    resources: Vec<CatalogResource>,
}

#[derive(Debug, Deserialize)]
struct CatalogResource {
    category: StrategyCategory,
    title: String,
    description: String,
    resource_type: ResourceType,
    #[serde(default)]
    url: Option<String>,
}

/// Immutable strategy + resource catalog.
#[derive(Debug)]
pub struct StrategyLibrary {
    strategies: Vec<Arc<Strategy>>,
    resources: Vec<(StrategyCategory, Arc<Resource>)>,
}

impl StrategyLibrary {
    /// The catalog that ships with the app.
    pub fn builtin() -> Self {
        Self {
            strategies: catalog::builtin_strategies().into_iter().map(Arc::new).collect(),
            resources: resources::builtin_resources()
                .into_iter()
                .map(|(c, r)| (c, Arc::new(r)))
                .collect(),
        }
    }

    /// Catalog from explicit records. Every strategy needs at least one step and a unique id.
    pub fn from_strategies(strategies: Vec<Strategy>) -> Result<Self, CatalogError> {
        Self::from_parts(strategies, Vec::new())
    }

    /// Loads a custom catalog from a TOML file (`[[strategies]]` and optional `[[resources]]`).
    pub fn load_toml(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&raw)?;
        let resources = file
            .resources
            .into_iter()
            .map(|r| {
                (
                    r.category,
                    Resource {
                        title: r.title,
                        description: r.description,
                        resource_type: r.resource_type,
                        url: r.url,
                    },
                )
            })
            .collect();
        let library = Self::from_parts(file.strategies, resources)?;
        tracing::info!(
            target: "resilient::strategies",
            path = %path.display(),
            strategies = library.len(),
            "custom strategy catalog loaded"
        );
        Ok(library)
    }

    fn from_parts(
        strategies: Vec<Strategy>,
        resources: Vec<(StrategyCategory, Resource)>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for s in &strategies {
            if s.steps.is_empty() {
                return Err(CatalogError::EmptySteps(s.id.clone()));
            }
            if !seen.insert(s.id.as_str()) {
                return Err(CatalogError::DuplicateId(s.id.clone()));
            }
        }
        Ok(Self {
            strategies: strategies.into_iter().map(Arc::new).collect(),
            resources: resources.into_iter().map(|(c, r)| (c, Arc::new(r))).collect(),
        })
    }

    pub fn all(&self) -> &[Arc<Strategy>] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Strategy>> {
        self.strategies.iter().find(|s| s.id == id).cloned()
    }

    /// Case-insensitive title lookup (used to map AI-suggested strategies back to the catalog).
    pub fn find_by_title(&self, title: &str) -> Option<Arc<Strategy>> {
        let title = title.trim();
        self.strategies
            .iter()
            .find(|s| s.title.eq_ignore_ascii_case(title))
            .cloned()
    }

    /// Exact category match, catalog order.
    pub fn strategies_by_category(&self, category: StrategyCategory) -> Vec<Arc<Strategy>> {
        self.strategies
            .iter()
            .filter(|s| s.category == category)
            .cloned()
            .collect()
    }

    /// Keyword heuristic: negative-affect moods get every mindfulness and self-care strategy,
    /// anything else gets the first five catalog entries. Intensity and trigger are accepted
    /// for call-site symmetry but do not affect the result.
    pub fn recommend(&self, mood: &str, _intensity: u8, _trigger: Option<&str>) -> Vec<Arc<Strategy>> {
        let mood = mood.to_lowercase();
        let negative = NEGATIVE_AFFECT_KEYWORDS.iter().any(|k| mood.contains(k));

        if negative {
            self.strategies
                .iter()
                .filter(|s| {
                    matches!(
                        s.category,
                        StrategyCategory::Mindfulness | StrategyCategory::SelfCare
                    )
                })
                .cloned()
                .collect()
        } else {
            self.strategies
                .iter()
                .take(DEFAULT_RECOMMENDATION_COUNT)
                .cloned()
                .collect()
        }
    }

    /// Resources filed under `category`, catalog order.
    pub fn resources_for(&self, category: StrategyCategory) -> Vec<Arc<Resource>> {
        self.resources
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, r)| Arc::clone(r))
            .collect()
    }
}
