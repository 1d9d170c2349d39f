use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bounds of the Medium, High and Critical bands.
pub const PRIORITY_THRESHOLDS: [f32; 3] = [0.4, 0.7, 0.9];

/// Human-facing priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn from_score(score: f32) -> Self {
        if score >= PRIORITY_THRESHOLDS[2] {
            Self::Critical
        } else if score >= PRIORITY_THRESHOLDS[1] {
            Self::High
        } else if score >= PRIORITY_THRESHOLDS[0] {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored complaint impact; same bands as [`PriorityLevel`], lower-case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    pub fn from_score(score: f32) -> Self {
        match PriorityLevel::from_score(score) {
            PriorityLevel::Low => Self::Low,
            PriorityLevel::Medium => Self::Medium,
            PriorityLevel::High => Self::High,
            PriorityLevel::Critical => Self::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Capitalized form used in tags ("High").
    pub fn capitalized(self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        let cases = [
            (0.9, PriorityLevel::Critical, ImpactLevel::Critical),
            (0.8999, PriorityLevel::High, ImpactLevel::High),
            (0.7, PriorityLevel::High, ImpactLevel::High),
            (0.6999, PriorityLevel::Medium, ImpactLevel::Medium),
            (0.4, PriorityLevel::Medium, ImpactLevel::Medium),
            (0.3999, PriorityLevel::Low, ImpactLevel::Low),
            (0.0, PriorityLevel::Low, ImpactLevel::Low),
            (1.0, PriorityLevel::Critical, ImpactLevel::Critical),
        ];
        for (score, priority, impact) in cases {
            assert_eq!(PriorityLevel::from_score(score), priority, "score {score}");
            assert_eq!(ImpactLevel::from_score(score), impact, "score {score}");
        }
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&PriorityLevel::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&ImpactLevel::High).unwrap(), "\"high\"");
        assert_eq!(ImpactLevel::Critical.capitalized(), "Critical");
        assert_eq!(PriorityLevel::Medium.to_string(), "Medium");
    }
}
