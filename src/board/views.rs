//! The shapes the job board client asks for, assembled from the resolvers.
//!
//! Each view registers all `Job.company` lookups of a resolver level, flushes the request's
//! company loader once, then awaits them, so a whole page of jobs costs one company batch.

use futures::future::try_join_all;
use serde::Serialize;

use super::context::RequestContext;
use super::error::ApiError;
use super::model::{Company, Job};
use super::resolvers::query;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRef {
    pub id: String,
    pub name: String,
}

impl From<Company> for CompanyRef {
    fn from(company: Company) -> Self {
        Self { id: company.id, name: company.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub company: CompanyRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBoard {
    pub items: Vec<JobSummary>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    pub id: String,
    pub title: String,
    pub date: String,
    pub company: CompanyRef,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyJob {
    pub id: String,
    pub date: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub jobs: Vec<CompanyJob>,
}

/// `jobs { id title date company { id name } }`
#[tracing::instrument(skip(ctx))]
pub async fn job_board(
    ctx: &RequestContext,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<JobBoard, ApiError> {
    let page = query::jobs(ctx, limit, offset).await?;
    let pending = page.items.iter().map(|job| job.company(ctx)).collect::<Vec<_>>();
    ctx.flush();
    let companies = try_join_all(pending).await?;
    let items = page
        .items
        .into_iter()
        .zip(companies)
        .map(|(job, company)| JobSummary {
            date: job.date(),
            id: job.id,
            title: job.title,
            company: company.into(),
        })
        .collect();
    Ok(JobBoard { items, total_count: page.total_count })
}

/// `job(id) { id title date company { id name } description }`
#[tracing::instrument(skip(ctx))]
pub async fn job_detail(ctx: &RequestContext, id: &str) -> Result<JobDetail, ApiError> {
    let job = query::job(ctx, id).await?;
    let pending = job.company(ctx);
    ctx.flush();
    let company = pending.await?;
    Ok(JobDetail {
        date: job.date(),
        id: job.id,
        title: job.title,
        company: company.into(),
        description: job.description,
    })
}

/// `company(id) { id name description jobs { id date title } }`
#[tracing::instrument(skip(ctx))]
pub async fn company_detail(ctx: &RequestContext, id: &str) -> Result<CompanyDetail, ApiError> {
    let company = query::company(ctx, id).await?;
    let jobs = company.jobs(ctx).await?.into_iter().map(company_job).collect();
    Ok(CompanyDetail { id: company.id, name: company.name, description: company.description, jobs })
}

fn company_job(job: Job) -> CompanyJob {
    CompanyJob { date: job.date(), id: job.id, title: job.title }
}
