/// Curated terms whose presence in a description raises the urgency feature.
pub const URGENCY_KEYWORDS: [&str; 38] = [
    "burst",
    "flooding",
    "critical",
    "emergency",
    "dangerous",
    "urgent",
    "toxic",
    "hazardous",
    "collapse",
    "explosion",
    "leak",
    "contaminated",
    "sparking",
    "exposed",
    "blocking",
    "overflow",
    "damage",
    "severe",
    "major",
    "broken",
    "failed",
    "failure",
    "accident",
    "injury",
    "injured",
    "fire",
    "smoke",
    "gas",
    "electrical",
    "water",
    "sewage",
    "health",
    "safety",
    "risk",
    "threat",
    "immediate",
    "multiple",
    "widespread",
];

/// Return true when a normalized token is one of the urgency keywords.
pub fn is_urgency_keyword(token: &str) -> bool {
    URGENCY_KEYWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_already_normalized() {
        for keyword in URGENCY_KEYWORDS {
            assert_eq!(super::super::tokenize(keyword), vec![keyword.to_string()]);
        }
    }

    #[test]
    fn matches_only_exact_tokens() {
        assert!(is_urgency_keyword("burst"));
        assert!(!is_urgency_keyword("bursting"));
        assert!(!is_urgency_keyword("Burst"));
    }
}
