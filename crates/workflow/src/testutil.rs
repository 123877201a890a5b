//! In-memory stand-ins for the external review source.

use crate::error::SourceError;
use crate::traits::ReviewSource;
use async_trait::async_trait;
use chrono::Utc;
use domain::{Metadata, NewReview, SourcePage, SourceRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use storage::Db;

pub struct FakeSource {
    records: Vec<SourceRecord>,
    pages: Mutex<HashMap<i64, SourcePage>>,
    deleted: Mutex<Vec<i64>>,
    fail_transport: AtomicBool,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::with_records(0)
    }
}

impl FakeSource {
    /// Each record gets its own source page so page-level skips stay precise.
    pub fn page_for(external_id: i64) -> i64 {
        1000 + external_id
    }

    pub fn with_records(count: u64) -> Self {
        let mut records = Vec::new();
        let mut pages = HashMap::new();
        for i in 1..=count as i64 {
            let page_id = Self::page_for(i);
            pages.insert(
                page_id,
                SourcePage {
                    page_id,
                    title: format!("Pagina {}", page_id),
                },
            );
            records.push(SourceRecord {
                external_id: i,
                page_id,
                author_name: format!("Auteur {}", i),
                author_email: format!("auteur{}@example.org", i),
                author_ip: "10.0.0.1".into(),
                body: format!("Opmerking nummer {}", i),
                submitted_at: Utc::now().naive_utc(),
                rating: Some(((i - 1) % 5 + 1) as i32),
                images: Vec::new(),
            });
        }
        Self {
            records,
            pages: Mutex::new(pages),
            deleted: Mutex::new(Vec::new()),
            fail_transport: AtomicBool::new(false),
        }
    }

    pub fn fail_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    pub fn remove_page(&self, page_id: i64) {
        self.pages.lock().unwrap().remove(&page_id);
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().unwrap().clone()
    }

    fn check_transport(&self) -> Result<(), SourceError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(SourceError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewSource for FakeSource {
    async fn count_approved(&self) -> Result<u64, SourceError> {
        self.check_transport()?;
        Ok(self.records.len() as u64)
    }

    async fn fetch_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, SourceError> {
        self.check_transport()?;
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|r| r.external_id);
        Ok(sorted
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_page(&self, page_id: i64) -> Result<Option<SourcePage>, SourceError> {
        self.check_transport()?;
        Ok(self.pages.lock().unwrap().get(&page_id).cloned())
    }

    async fn delete_record(&self, external_id: i64) -> Result<(), SourceError> {
        self.check_transport()?;
        self.deleted.lock().unwrap().push(external_id);
        Ok(())
    }
}

pub async fn seed_review(db: &Db, external_id: Option<i64>, page_id: i64) -> i64 {
    db.insert_review(NewReview {
        external_id,
        page_id,
        page_title: format!("Pagina {}", page_id),
        author_name: "Jan".into(),
        author_email: "jan@example.org".into(),
        author_ip: "127.0.0.1".into(),
        body: "Prima geregeld".into(),
        rating: Some(5),
        images: Vec::new(),
        metadata: Metadata::new(),
        submitted_at: Utc::now().naive_utc(),
    })
    .await
    .unwrap()
}
