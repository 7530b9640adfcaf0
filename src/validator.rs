use regex::Regex;

/// Word-boundary matched pattern groups for content that must never reach
/// the LLM: profanity, violence/self-harm, explicit content, discrimination.
const INAPPROPRIATE_PATTERNS: &[&str] = &[
    r"\b(fuck|shit|damn|bitch|asshole|crap)\b",
    r"\b(hate|kill|die|murder|suicide)\b",
    r"\b(porn|sex|nude|naked)\b",
    r"\b(racist|sexist|homophobic)\b",
];

/// Screens incident text before any LLM call is made.
///
/// Both checks are pure predicates; a hit short-circuits the pipeline into
/// a deterministic fallback response, so the engine behaves safely even
/// when the LLM is unreachable.
pub struct ContentValidator {
    inappropriate: Vec<Regex>,
    non_word_only: Regex,
}

impl ContentValidator {
    pub fn new() -> Self {
        let inappropriate = INAPPROPRIATE_PATTERNS
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("invalid inappropriate pattern"))
            .collect();
        let non_word_only = Regex::new(r"^[0-9\s\W]+$").expect("invalid non-word pattern");
        Self {
            inappropriate,
            non_word_only,
        }
    }

    /// True if the description matches any of the fixed inappropriate
    /// patterns. Word-boundary matched, not substring: "classify" is clean.
    pub fn is_inappropriate(&self, description: &str) -> bool {
        self.inappropriate.iter().any(|re| re.is_match(description))
    }

    /// True if the description is too vague to classify: shorter than 10
    /// characters once trimmed, fewer than 3 distinct case-folded non-space
    /// characters, or no letters at all.
    pub fn is_ambiguous(&self, description: &str) -> bool {
        let description = description.trim();
        if description.chars().count() < 10 {
            return true;
        }
        let distinct: std::collections::HashSet<char> = description
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if distinct.len() < 3 {
            return true;
        }
        self.non_word_only.is_match(description)
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new()
    }
}
