//! Cross-kind search hits

use crate::domain::kind::RecordKind;
use crate::domain::record::Record;
use serde::Serialize;

const PREVIEW_CHARS: usize = 100;

/// One search result, pointing at a record of some kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub category: String,
    pub kind: RecordKind,
    pub preview: String,
}

impl SearchHit {
    pub fn from_record<R: Record>(record: &R) -> Self {
        SearchHit {
            id: record.id().to_string(),
            title: record.title().to_string(),
            category: record.search_category(),
            kind: R::KIND,
            preview: record.content().chars().take(PREVIEW_CHARS).collect(),
        }
    }

    /// Case-insensitive substring match on title, category and preview.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.title, &self.category, &self.preview]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{Grade, Notice, ResearchMaterial, SchoolType};

    #[test]
    fn test_preview_is_truncated_by_chars() {
        let notice = Notice::new("t", "가".repeat(150));
        let hit = SearchHit::from_record(&notice);
        assert_eq!(hit.preview.chars().count(), 100);
        assert_eq!(hit.kind, RecordKind::Notice);
    }

    #[test]
    fn test_matches_title_category_and_preview() {
        let mut research = ResearchMaterial::new(SchoolType::Middle, Grade::Second, "u", "Linear Functions");
        research.author = "Park".to_string();
        research.content = "slope and intercept".to_string();
        let hit = SearchHit::from_record(&research);

        assert!(hit.matches("linear"));
        assert!(hit.matches("PARK"));
        assert!(hit.matches("중2"));
        assert!(hit.matches("Intercept"));
        assert!(!hit.matches("quadratic"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let hit = SearchHit::from_record(&Notice::new("t", "c"));
        assert!(hit.matches(""));
        assert!(hit.matches("   "));
    }
}
