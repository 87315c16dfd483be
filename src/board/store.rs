use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::model::{Company, Job, JobUpdate, NewJob};

/// Database collaborator behind the job board resolvers.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_company(&self, id: &str) -> Result<Option<Company>, StoreError>;

    /// Fetches every company whose id is in `ids`. Unknown ids are simply left out, in no
    /// particular order.
    async fn get_companies(&self, ids: &[String]) -> Result<Vec<Company>, StoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Jobs ordered newest first.
    async fn get_jobs(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Job>, StoreError>;

    async fn count_jobs(&self) -> Result<usize, StoreError>;

    async fn get_jobs_by_company(&self, company_id: &str) -> Result<Vec<Job>, StoreError>;

    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError>;

    /// Removes the job only if it belongs to `company_id`.
    async fn delete_job(&self, id: &str, company_id: &str) -> Result<Option<Job>, StoreError>;

    /// Rewrites title and description only if the job belongs to `update.company_id`.
    async fn update_job(&self, update: JobUpdate) -> Result<Option<Job>, StoreError>;
}

#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<String, Company>,
    jobs: Vec<Job>,
}

/// In-memory [`JobStore`], used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a JSON document of the form `{"companies": [...], "jobs": [...]}`.
    pub fn from_json(seed: &str) -> Result<Self, StoreError> {
        let seed: Seed =
            serde_json::from_str(seed).map_err(|e| StoreError::InvalidSeed(e.to_string()))?;
        let companies = seed.companies.into_iter().map(|c| (c.id.clone(), c)).collect();
        Ok(Self { tables: RwLock::new(Tables { companies, jobs: seed.jobs }) })
    }

    pub async fn insert_company(&self, company: Company) {
        self.tables.write().await.companies.insert(company.id.clone(), company);
    }
}

fn newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get_company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        Ok(self.tables.read().await.companies.get(id).cloned())
    }

    async fn get_companies(&self, ids: &[String]) -> Result<Vec<Company>, StoreError> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.companies.get(id).cloned()).collect())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.tables.read().await.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn get_jobs(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Job>, StoreError> {
        let mut jobs = self.tables.read().await.jobs.clone();
        newest_first(&mut jobs);
        Ok(jobs
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_jobs(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.jobs.len())
    }

    async fn get_jobs_by_company(&self, company_id: &str) -> Result<Vec<Job>, StoreError> {
        let mut jobs = self
            .tables
            .read()
            .await
            .jobs
            .iter()
            .filter(|j| j.company_id == company_id)
            .cloned()
            .collect::<Vec<_>>();
        newest_first(&mut jobs);
        Ok(jobs)
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        let job = Job {
            id: Uuid::new_v4().to_string(),
            company_id: job.company_id,
            title: job.title,
            description: job.description,
            created_at: Utc::now(),
        };
        self.tables.write().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn delete_job(&self, id: &str, company_id: &str) -> Result<Option<Job>, StoreError> {
        let mut tables = self.tables.write().await;
        let position = tables.jobs.iter().position(|j| j.id == id && j.company_id == company_id);
        Ok(position.map(|i| tables.jobs.remove(i)))
    }

    async fn update_job(&self, update: JobUpdate) -> Result<Option<Job>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(job) =
            tables.jobs.iter_mut().find(|j| j.id == update.id && j.company_id == update.company_id)
        else {
            return Ok(None);
        };
        job.title = update.title;
        job.description = update.description;
        Ok(Some(job.clone()))
    }
}
