//! Per-grade catalog views and research view counting

use crate::application::store::ContentStore;
use crate::domain::collection::find_by_id;
use crate::domain::{ApiResponse, Grade, Record, ResearchMaterial, SchoolType};
use crate::error::{CbciError, Result};
use serde_json::json;

/// Records of one kind for a school level and grade, in stored order
pub async fn by_school_grade<R: Record>(
    store: &ContentStore,
    school: SchoolType,
    grade: Grade,
) -> ApiResponse<Vec<R>> {
    store.get_all::<R>().await.map(|records| {
        records
            .into_iter()
            .filter(|r| r.school_grade() == Some((school, grade)))
            .collect()
    })
}

/// Open a research record, counting the view
pub async fn try_open_research(store: &ContentStore, id: &str) -> Result<ResearchMaterial> {
    let kind = ResearchMaterial::KIND;
    let documents = store.try_list_documents(kind).await?;
    let current: ResearchMaterial = match find_by_id(&documents, id) {
        Some(document) => serde_json::from_value(document.clone())?,
        None => return Err(CbciError::NotFound(kind.not_found_message())),
    };

    let updated = store
        .try_update_document(kind, id, json!({ "views": current.views + 1 }))
        .await?;
    Ok(serde_json::from_value(updated)?)
}

/// Contract form of [`try_open_research`]
pub async fn open_research(store: &ContentStore, id: &str) -> ApiResponse<ResearchMaterial> {
    match try_open_research(store, id).await {
        Ok(record) => ApiResponse::ok(record),
        Err(e) => ApiResponse::fail(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LessonMaterial, Notice};
    use crate::infrastructure::LocalStore;
    use tempfile::TempDir;

    fn research(id: &str, school: SchoolType, grade: Grade) -> ResearchMaterial {
        let mut material = ResearchMaterial::new(school, grade, "u", id);
        material.id = id.to_string();
        material
    }

    #[tokio::test]
    async fn test_filter_keeps_newest_first() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::local(LocalStore::new(temp.path().to_path_buf()));

        store.create(&research("r1", SchoolType::Middle, Grade::First)).await;
        store.create(&research("other", SchoolType::High, Grade::First)).await;
        store.create(&research("r2", SchoolType::Middle, Grade::First)).await;

        let found = by_school_grade::<ResearchMaterial>(&store, SchoolType::Middle, Grade::First)
            .await
            .data
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn test_notices_have_no_grade() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::local(LocalStore::new(temp.path().to_path_buf()));
        store.create(&Notice::new("t", "c")).await;
        store
            .create(&LessonMaterial::new(SchoolType::Middle, Grade::First, "u", "t"))
            .await;

        let notices = by_school_grade::<Notice>(&store, SchoolType::Middle, Grade::First)
            .await
            .data
            .unwrap();
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_open_research_counts_views() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::local(LocalStore::new(temp.path().to_path_buf()));
        store.create(&research("r1", SchoolType::Middle, Grade::Second)).await;

        assert_eq!(open_research(&store, "r1").await.data.unwrap().views, 1);
        assert_eq!(open_research(&store, "r1").await.data.unwrap().views, 2);

        let missing = open_research(&store, "nope").await;
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("Research not found"));
        assert!(matches!(
            try_open_research(&store, "nope").await,
            Err(CbciError::NotFound(_))
        ));
    }
}
