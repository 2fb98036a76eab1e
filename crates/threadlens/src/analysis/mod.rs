//! Structured analysis types
//!
//! Defines the JSON document the providers are asked to produce and the
//! parser that turns raw model output into it. The wire shape is camelCase
//! because the browser side consumes these documents directly.

use serde::{Deserialize, Serialize};

/// Structured analysis of one email thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Brief summary of the thread
    pub summary: String,
    /// Conclusions reached or decisions made
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    /// Tasks assigned in the thread
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    /// Unresolved questions needing follow-up
    #[serde(default)]
    pub open_questions: Vec<OpenQuestion>,
    /// Main subjects discussed
    #[serde(default)]
    pub key_topics: Vec<KeyTopic>,
}

/// A conclusion or decision found in the thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub description: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// A task assigned in the thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub task: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    pub priority: Priority,
    pub status: Status,
}

/// An unresolved question raised in the thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question: String,
    #[serde(default)]
    pub context: Option<String>,
    pub urgency: Priority,
}

/// A subject discussed in the thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTopic {
    pub topic: String,
    pub description: String,
}

/// Priority/urgency level attached to action items and open questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Progress state of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl AnalysisResult {
    /// Parse raw model output into an analysis document.
    ///
    /// Models occasionally wrap their JSON in a Markdown code fence despite
    /// being told not to; the fence is stripped before strict parsing.
    /// Anything else that fails to deserialize is an error, never partial
    /// data.
    pub fn from_model_output(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_code_fence(raw))
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let opened = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    opened.strip_suffix("```").unwrap_or(opened).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_analysis_json;

    #[test]
    fn test_parse_full_document() {
        let raw = sample_analysis_json().to_string();
        let analysis = AnalysisResult::from_model_output(&raw).unwrap();

        assert_eq!(analysis.summary, "Release planning for the Friday ship");
        assert_eq!(analysis.outcomes.len(), 1);
        assert_eq!(analysis.action_items.len(), 1);
        assert_eq!(analysis.action_items[0].priority, Priority::High);
        assert_eq!(analysis.action_items[0].status, Status::InProgress);
        assert_eq!(analysis.open_questions[0].urgency, Priority::Medium);
        assert_eq!(analysis.key_topics[0].topic, "Release");
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let raw = format!("```json\n{}\n```", sample_analysis_json());
        let analysis = AnalysisResult::from_model_output(&raw).unwrap();
        assert_eq!(analysis.summary, "Release planning for the Friday ship");

        let raw = format!("```\n{}\n```", sample_analysis_json());
        assert!(AnalysisResult::from_model_output(&raw).is_ok());
    }

    #[test]
    fn test_parse_missing_arrays_default_to_empty() {
        let analysis =
            AnalysisResult::from_model_output(r#"{"summary": "Quiet thread"}"#).unwrap();
        assert_eq!(analysis.summary, "Quiet thread");
        assert!(analysis.outcomes.is_empty());
        assert!(analysis.action_items.is_empty());
        assert!(analysis.open_questions.is_empty());
        assert!(analysis.key_topics.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_summary() {
        assert!(AnalysisResult::from_model_output(r#"{"outcomes": []}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_enum_value() {
        let raw = r#"{
            "summary": "s",
            "actionItems": [{"task": "t", "priority": "urgent", "status": "pending"}]
        }"#;
        assert!(AnalysisResult::from_model_output(raw).is_err());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(AnalysisResult::from_model_output("Here is the analysis you asked for").is_err());
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let analysis = AnalysisResult {
            summary: "s".to_string(),
            outcomes: Vec::new(),
            action_items: vec![ActionItem {
                task: "t".to_string(),
                assignee: None,
                due_date: Some("Thursday".to_string()),
                priority: Priority::Low,
                status: Status::InProgress,
            }],
            open_questions: Vec::new(),
            key_topics: Vec::new(),
        };

        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("actionItems").is_some());
        assert!(value.get("openQuestions").is_some());
        assert!(value.get("keyTopics").is_some());
        assert_eq!(value["actionItems"][0]["dueDate"], "Thursday");
        assert_eq!(value["actionItems"][0]["priority"], "low");
        assert_eq!(value["actionItems"][0]["status"], "in-progress");
    }

    #[test]
    fn test_status_round_trips_kebab_case() {
        let status: Status = serde_json::from_str(r#""in-progress""#).unwrap();
        assert_eq!(status, Status::InProgress);
        assert_eq!(serde_json::to_string(&Status::Pending).unwrap(), r#""pending""#);
    }
}
