// file: src/pubmed/filter.rs
// description: publication-type allow-list deciding which articles get summarized
// reference: https://pubmed.ncbi.nlm.nih.gov/help/#publication-types

pub const DEFAULT_PUBLICATION_TYPES: [&str; 7] = [
    "Journal Article",
    "Books and Documents",
    "Clinical Trial",
    "Meta-Analysis",
    "Randomized Controlled Trial",
    "Review",
    "Systematic Review",
];

#[derive(Debug, Clone)]
pub struct PublicationTypeFilter {
    allowed: Vec<String>,
}

impl PublicationTypeFilter {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// True when at least one of the article's types is on the allow-list.
    pub fn accepts<S: AsRef<str>>(&self, publication_types: &[S]) -> bool {
        publication_types
            .iter()
            .any(|t| self.allowed.iter().any(|a| a == t.as_ref()))
    }
}

impl Default for PublicationTypeFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_PUBLICATION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_any_allowed_type() {
        let filter = PublicationTypeFilter::default();
        assert!(filter.accepts(&["Journal Article"]));
        assert!(filter.accepts(&["Editorial", "Systematic Review"]));
        for t in DEFAULT_PUBLICATION_TYPES {
            assert!(filter.accepts(&[t]), "{t} should be accepted");
        }
    }

    #[test]
    fn test_rejects_disjoint_and_empty() {
        let filter = PublicationTypeFilter::default();
        assert!(!filter.accepts(&["Editorial", "Comment", "Letter"]));
        assert!(!filter.accepts::<&str>(&[]));
    }

    #[test]
    fn test_match_is_exact() {
        let filter = PublicationTypeFilter::default();
        assert!(!filter.accepts(&["journal article"]));
        assert!(!filter.accepts(&["Review Literature"]));
    }

    #[test]
    fn test_custom_allow_list() {
        let filter = PublicationTypeFilter::new(vec!["Preprint".to_string()]);
        assert!(filter.accepts(&["Preprint"]));
        assert!(!filter.accepts(&["Journal Article"]));
    }
}
