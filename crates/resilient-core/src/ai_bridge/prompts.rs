//! Prompt construction and tolerant parsing of what comes back.

use crate::error::ParseError;
use crate::mood::MoodEntry;
use serde::{Deserialize, Serialize};

/// Strategies requested from the model per call.
pub const STRATEGY_COUNT: usize = 5;

/// Shape requested from `analyze_mood_patterns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub recommendations: Vec<AiRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendation {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "trigger_pattern")]
    pub trigger_pattern: String,
    #[serde(default, alias = "confidence_level")]
    pub confidence_level: f64,
    #[serde(default)]
    pub strategies: Vec<AiStrategy>,
    #[serde(default)]
    pub resources: Vec<AiResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStrategy {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "time_to_complete")]
    pub time_to_complete: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResource {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptEntry<'a> {
    date: String,
    mood: &'a str,
    intensity: u8,
    note: Option<&'a str>,
    is_rejection_related: bool,
    rejection_trigger: Option<&'a str>,
    coping_strategy_used: Option<&'a str>,
}

#[derive(Deserialize)]
struct StrategyList {
    strategies: Vec<String>,
}

pub fn mood_analysis_prompt(entries: &[MoodEntry]) -> String {
    let rows: Vec<PromptEntry<'_>> = entries
        .iter()
        .map(|e| PromptEntry {
            date: e.date.format("%Y-%m-%d %H:%M").to_string(),
            mood: &e.mood,
            intensity: e.intensity,
            note: e.note.as_deref(),
            is_rejection_related: e.is_rejection_related,
            rejection_trigger: e.rejection_trigger.as_deref(),
            coping_strategy_used: e.coping_strategy_used.as_deref(),
        })
        .collect();
    let serialized = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Here are my recent mood journal entries (intensity 1-5):\n{serialized}\n\n\
         Analyze the patterns, paying attention to rejection-related triggers, and suggest \
         personalized coping recommendations. Respond only with JSON in this exact shape:\n\
         {{\"recommendations\": [{{\"title\": \"\", \"description\": \"\", \"triggerPattern\": \"\", \
         \"confidenceLevel\": 0.0, \"strategies\": [{{\"title\": \"\", \"description\": \"\", \
         \"category\": \"mindfulness|cognitive|physical|social|creative|selfCare\", \
         \"timeToComplete\": \"\", \"steps\": [\"\"]}}], \"resources\": [{{\"title\": \"\", \
         \"description\": \"\", \"type\": \"article|video|audio|app|book|exercise\", \"url\": \"\"}}]}}]}}"
    )
}

pub fn coping_strategies_prompt(mood: &str, trigger: Option<&str>) -> String {
    let mut prompt = format!("I'm feeling {mood}.");
    if let Some(t) = trigger.filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!(" This was triggered by: {t}."));
    }
    prompt.push_str(&format!(
        " Suggest exactly {STRATEGY_COUNT} short, practical coping strategies I can use right now. \
         Respond only with JSON: {{\"strategies\": [\"...\"]}}"
    ));
    prompt
}

pub fn journal_prompt_request(mood: &str, trigger: Option<&str>) -> String {
    let mut prompt = format!("Write a gentle journaling prompt for someone feeling {mood}");
    if let Some(t) = trigger.filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!(" after experiencing {t}"));
    }
    prompt.push_str(
        ". The prompt should be 2-3 sentences, encourage self-reflection and growth, \
         and be returned as plain text.",
    );
    prompt
}

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_analysis(raw: &str) -> Result<AnalysisReport, ParseError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ParseError::NotJson(e.to_string()))?;
    if value.get("recommendations").is_none() {
        return Err(ParseError::MissingField("recommendations"));
    }
    serde_json::from_value(value).map_err(|e| ParseError::NotJson(e.to_string()))
}

/// Parses `{"strategies": [...]}`.
pub fn parse_strategy_json(raw: &str) -> Result<Vec<String>, ParseError> {
    let list: StrategyList = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ParseError::NotJson(e.to_string()))?;
    Ok(list
        .strategies
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// JSON first; otherwise one strategy per non-blank line.
pub fn parse_strategy_list(raw: &str) -> Vec<String> {
    match parse_strategy_json(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::debug!(
                target: "resilient::ai_bridge",
                error = %e,
                "strategy response not JSON; splitting lines"
            );
            raw.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_fallback_drops_blank_lines() {
        let raw = "  Take a walk  \n\n1. Call a friend\n   \nBreathe slowly\n";
        assert_eq!(
            parse_strategy_list(raw),
            vec!["Take a walk", "1. Call a friend", "Breathe slowly"]
        );
    }

    #[test]
    fn json_strategies_parsed() {
        let raw = r#"{"strategies": ["Walk", " Stretch ", ""]}"#;
        assert_eq!(parse_strategy_list(raw), vec!["Walk", "Stretch"]);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"strategies\": [\"Walk\"]}\n```";
        assert_eq!(parse_strategy_list(raw), vec!["Walk"]);
    }

    #[test]
    fn analysis_requires_recommendations_key() {
        assert_eq!(
            parse_analysis(r#"{"foo": 1}"#),
            Err(ParseError::MissingField("recommendations"))
        );
        assert!(matches!(parse_analysis("not json"), Err(ParseError::NotJson(_))));
    }

    #[test]
    fn analysis_parses_nested_shape() {
        let raw = r#"{"recommendations": [{
            "title": "Soften rejection sting",
            "description": "You log rejection at work often.",
            "triggerPattern": "work rejection",
            "confidenceLevel": 0.8,
            "strategies": [{"title": "Box Breathing", "description": "", "steps": ["in", "out"]}],
            "resources": [{"title": "Guide", "description": "d", "type": "video"}]
        }]}"#;
        let report = parse_analysis(raw).unwrap();
        let rec = &report.recommendations[0];
        assert_eq!(rec.trigger_pattern, "work rejection");
        assert_eq!(rec.strategies[0].steps.len(), 2);
        assert_eq!(rec.resources[0].resource_type.as_deref(), Some("video"));
    }

    #[test]
    fn prompts_mention_trigger_only_when_present() {
        assert!(coping_strategies_prompt("sad", Some("job")).contains("job"));
        assert!(!coping_strategies_prompt("sad", Some("  ")).contains("triggered"));
        assert!(journal_prompt_request("hurt", None).starts_with("Write a gentle"));
    }

    #[test]
    fn analysis_prompt_serializes_rejection_fields() {
        let entry = MoodEntry::new("sad", 4).with_rejection(Some("interview"));
        let prompt = mood_analysis_prompt(&[entry]);
        assert!(prompt.contains("\"isRejectionRelated\": true"));
        assert!(prompt.contains("interview"));
    }
}
