use super::StrategyCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Article,
    Video,
    Audio,
    App,
    Book,
    Exercise,
}

impl ResourceType {
    /// Lenient parse for AI-supplied values; unknown kinds become `Article`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "video" => ResourceType::Video,
            "audio" | "podcast" => ResourceType::Audio,
            "app" => ResourceType::App,
            "book" => ResourceType::Book,
            "exercise" => ResourceType::Exercise,
            _ => ResourceType::Article,
        }
    }
}

/// Supporting material attached to a recommendation. Static or AI-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub description: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub url: Option<String>,
}

fn resource(title: &str, description: &str, resource_type: ResourceType, url: Option<&str>) -> Resource {
    Resource {
        title: title.to_string(),
        description: description.to_string(),
        resource_type,
        url: url.map(str::to_string),
    }
}

pub(super) fn builtin_resources() -> Vec<(StrategyCategory, Resource)> {
    use ResourceType::*;
    use StrategyCategory::*;

    vec![
        (
            Mindfulness,
            resource(
                "Guided Breathing Session",
                "A short audio guide for slow, paced breathing.",
                Audio,
                None,
            ),
        ),
        (
            Mindfulness,
            resource(
                "Grounding for Anxious Moments",
                "Sensory grounding techniques you can use anywhere.",
                Exercise,
                None,
            ),
        ),
        (
            Cognitive,
            resource(
                "Understanding Cognitive Distortions",
                "How common thinking traps amplify painful feelings.",
                Article,
                None,
            ),
        ),
        (
            Cognitive,
            resource(
                "Rejection Proof",
                "A memoir about deliberately seeking out rejection to lose the fear of it.",
                Book,
                None,
            ),
        ),
        (
            Physical,
            resource(
                "Desk Stretch Routine",
                "A five-minute stretching sequence for tense shoulders and back.",
                Video,
                None,
            ),
        ),
        (
            Social,
            resource(
                "Asking for Support",
                "Simple scripts for reaching out when you are struggling.",
                Article,
                None,
            ),
        ),
        (
            Creative,
            resource(
                "Journaling Through Hard Days",
                "Prompts for expressive writing after setbacks.",
                Exercise,
                None,
            ),
        ),
        (
            SelfCare,
            resource(
                "Self-Compassion Practices",
                "Short exercises for treating yourself with kindness.",
                Exercise,
                Some("https://self-compassion.org/self-compassion-practices/"),
            ),
        ),
        (
            SelfCare,
            resource(
                "Sleep Hygiene Basics",
                "Habits that make rest more restorative.",
                Article,
                None,
            ),
        ),
    ]
}
