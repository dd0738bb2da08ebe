//! Search across every record kind

use crate::application::store::ContentStore;
use crate::domain::{
    CbciMaterial, EvaluationMaterial, LessonMaterial, Notice, Record, ResearchMaterial, SearchHit,
};

pub struct SearchService<'a> {
    store: &'a ContentStore,
}

impl<'a> SearchService<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        SearchService { store }
    }

    async fn hits_of<R: Record>(&self, hits: &mut Vec<SearchHit>) {
        if let Some(records) = self.store.get_all::<R>().await.data {
            hits.extend(records.iter().map(SearchHit::from_record));
        }
    }

    /// Every record as a hit: notices, lessons, research, evaluations, cbci
    pub async fn all_hits(&self) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        self.hits_of::<Notice>(&mut hits).await;
        self.hits_of::<LessonMaterial>(&mut hits).await;
        self.hits_of::<ResearchMaterial>(&mut hits).await;
        self.hits_of::<EvaluationMaterial>(&mut hits).await;
        self.hits_of::<CbciMaterial>(&mut hits).await;
        hits
    }

    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        self.all_hits()
            .await
            .into_iter()
            .filter(|hit| hit.matches(query))
            .collect()
    }

    /// The first `n` hits without filtering
    pub async fn recent(&self, n: usize) -> Vec<SearchHit> {
        let mut hits = self.all_hits().await;
        hits.truncate(n);
        hits
    }
}
