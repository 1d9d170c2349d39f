use serde::{Deserialize, Serialize};

use super::labels::{ImpactLevel, PriorityLevel};

/// Score assigned when the model cannot produce one.
pub const FALLBACK_SCORE: f32 = 0.5;
const UNKNOWN_LOCATION: &str = "Unknown";

/// Complaint fields the scorer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintPayload {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl ComplaintPayload {
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    fn location_or_unknown(&self) -> String {
        self.location
            .clone()
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    pub value: String,
}

impl Tag {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// Score, labels and tags for one complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityResult {
    pub score: f32,
    pub priority_level: PriorityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<ImpactLevel>,
    pub tags: Vec<Tag>,
    /// True when the score did not come from the model.
    #[serde(default)]
    pub fallback: bool,
}

impl PriorityResult {
    /// Derive labels and tags from a model score.
    pub fn from_score(score: f32, payload: &ComplaintPayload) -> Self {
        let priority_level = PriorityLevel::from_score(score);
        let impact_level = ImpactLevel::from_score(score);
        Self {
            score,
            priority_level,
            impact_level: Some(impact_level),
            tags: vec![
                Tag::new("Priority", priority_level.as_str()),
                Tag::new("Impact", impact_level.capitalized()),
                Tag::new("Urgency Score", format!("{score:.2}")),
                Tag::new("Location", payload.location_or_unknown()),
            ],
            fallback: false,
        }
    }

    /// Fixed result served when scoring fails.
    pub fn fallback(payload: &ComplaintPayload) -> Self {
        Self {
            score: FALLBACK_SCORE,
            priority_level: PriorityLevel::Medium,
            impact_level: None,
            tags: vec![
                Tag::new("Priority", PriorityLevel::Medium.as_str()),
                Tag::new("Urgency Score", format!("{FALLBACK_SCORE:.2}")),
                Tag::new("Location", payload.location_or_unknown()),
            ],
            fallback: true,
        }
    }

    /// Value of the first tag with this label.
    pub fn tag(&self, label: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.label == label)
            .map(|tag| tag.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_result_tags_in_order() {
        let payload = ComplaintPayload::new("roads", "pothole").with_location("MG Road");
        let result = PriorityResult::from_score(0.734, &payload);
        let labels: Vec<&str> = result.tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["Priority", "Impact", "Urgency Score", "Location"]);
        assert_eq!(result.tag("Priority"), Some("High"));
        assert_eq!(result.tag("Impact"), Some("High"));
        assert_eq!(result.tag("Urgency Score"), Some("0.73"));
        assert_eq!(result.tag("Location"), Some("MG Road"));
        assert!(!result.fallback);
    }

    #[test]
    fn fallback_shape() {
        let result = PriorityResult::fallback(&ComplaintPayload::default());
        assert_eq!(result.score, 0.5);
        assert_eq!(result.priority_level, PriorityLevel::Medium);
        assert_eq!(result.impact_level, None);
        assert_eq!(result.tag("Urgency Score"), Some("0.50"));
        assert_eq!(result.tag("Location"), Some("Unknown"));
        assert_eq!(result.tag("Impact"), None);
        assert!(result.fallback);
    }

    #[test]
    fn serializes_camel_case_for_the_complaint_service() {
        let payload = ComplaintPayload::new("roads", "pothole");
        let json = serde_json::to_value(PriorityResult::from_score(0.2, &payload)).unwrap();
        assert_eq!(json["priorityLevel"], "Low");
        assert_eq!(json["impactLevel"], "low");
        assert_eq!(json["tags"][0]["label"], "Priority");
        let fallback = serde_json::to_value(PriorityResult::fallback(&payload)).unwrap();
        assert!(fallback.get("impactLevel").is_none());
    }

    #[test]
    fn payload_fields_default_when_missing() {
        let payload: ComplaintPayload = serde_json::from_str(r#"{"category":"roads"}"#).unwrap();
        assert_eq!(payload.description, "");
        assert_eq!(payload.location, None);
    }
}
