//! Request and response shapes of the insight generator.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_INSIGHTS, MAX_INSIGHT_MESSAGE_CHARS};
use crate::types::MedicationLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Reminder,
    Achievement,
    Suggestion,
    Warning,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

/// A short categorized advisory message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub priority: InsightPriority,
}

impl AiInsight {
    /// Returned whenever generation fails.
    pub fn fallback() -> Self {
        Self {
            kind: InsightKind::Suggestion,
            title: "Stay Consistent".to_string(),
            message: "Regular medication timing helps maintain steady health benefits."
                .to_string(),
            priority: InsightPriority::Medium,
        }
    }

    /// Clamp `message` to the advertised length, on a char boundary.
    pub fn truncated(mut self) -> Self {
        if let Some((idx, _)) = self.message.char_indices().nth(MAX_INSIGHT_MESSAGE_CHARS) {
            self.message.truncate(idx);
        }
        self
    }
}

/// Limit a generated list to [`MAX_INSIGHTS`] entries with clamped messages.
pub fn normalize_insights(insights: Vec<AiInsight>) -> Vec<AiInsight> {
    insights
        .into_iter()
        .take(MAX_INSIGHTS)
        .map(AiInsight::truncated)
        .collect()
}

/// Aggregate statistics handed to the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    /// Weekly adherence percentage, 0-100.
    pub adherence_rate: u32,
    pub missed_today: usize,
    pub active_medications: usize,
    pub recent_logs: Vec<MedicationLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub medication_name: String,
    pub time: String,
    #[serde(default)]
    pub context: String,
}

impl ReminderRequest {
    /// Sentence used when the generator cannot produce one.
    pub fn fallback_reminder(&self) -> String {
        format!(
            "Time for your {}! Your health supports your business success.",
            self.medication_name
        )
    }

    /// Sentence used when the generator answers without a reminder.
    pub fn default_reminder(&self) -> String {
        format!(
            "Time for your {}! Stay healthy, stay productive.",
            self.medication_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let value = serde_json::to_value(AiInsight::fallback()).unwrap();
        assert_eq!(value["type"], "suggestion");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["title"], "Stay Consistent");
    }

    #[test]
    fn test_normalize_caps_count_and_length() {
        let long = AiInsight {
            message: "x".repeat(150),
            ..AiInsight::fallback()
        };
        let out = normalize_insights(vec![long.clone(), long.clone(), long.clone(), long]);
        assert_eq!(out.len(), MAX_INSIGHTS);
        assert!(out.iter().all(|i| i.message.chars().count() == MAX_INSIGHT_MESSAGE_CHARS));
    }

    #[test]
    fn test_reminder_templates_mention_medication() {
        let req: ReminderRequest = serde_json::from_str(
            r#"{"medicationName":"Vitamin D","time":"09:00"}"#,
        )
        .unwrap();
        assert_eq!(req.context, "");
        assert!(req.fallback_reminder().contains("Vitamin D"));
        assert!(req.default_reminder().contains("Vitamin D"));
    }
}
