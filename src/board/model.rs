//! Job board records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub company_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller. Token parsing happens before a request reaches the resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub company_id: String,
    pub email: String,
}

/// One page of `Query.jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsPage {
    pub items: Vec<Job>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateJobInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateJobInput {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Store-level update; scoped to the company that owns the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
}

/// Store-level insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
}
