//! Resolvers for the job board's `Query`, `Mutation`, `Job` and `Company` types.
//!
//! Each resolver takes the per-request [`RequestContext`] by reference. Mutations require an
//! authenticated user and only ever touch jobs owned by that user's company.

use std::future::Future;

use super::context::RequestContext;
use super::error::ApiError;
use super::model::{
    Company, CreateJobInput, Job, JobUpdate, JobsPage, NewJob, UpdateJobInput, User,
};

fn require_user(ctx: &RequestContext) -> Result<&User, ApiError> {
    ctx.user.as_ref().ok_or_else(ApiError::missing_authentication)
}

fn job_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("No job found with id - {id}"))
}

fn company_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("No company found with id - {id}"))
}

pub mod query {
    use super::*;

    #[tracing::instrument(skip(ctx))]
    pub async fn company(ctx: &RequestContext, id: &str) -> Result<Company, ApiError> {
        ctx.store().get_company(id).await?.ok_or_else(|| company_not_found(id))
    }

    #[tracing::instrument(skip(ctx))]
    pub async fn job(ctx: &RequestContext, id: &str) -> Result<Job, ApiError> {
        ctx.store().get_job(id).await?.ok_or_else(|| job_not_found(id))
    }

    #[tracing::instrument(skip(ctx))]
    pub async fn jobs(
        ctx: &RequestContext,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<JobsPage, ApiError> {
        let items = ctx.store().get_jobs(limit, offset).await?;
        let total_count = ctx.store().count_jobs().await?;
        Ok(JobsPage { items, total_count })
    }
}

pub mod mutation {
    use super::*;

    #[tracing::instrument(skip(ctx))]
    pub async fn create_job(ctx: &RequestContext, input: CreateJobInput) -> Result<Job, ApiError> {
        let user = require_user(ctx)?;
        let job = NewJob {
            company_id: user.company_id.clone(),
            title: input.title,
            description: input.description,
        };
        Ok(ctx.store().create_job(job).await?)
    }

    #[tracing::instrument(skip(ctx))]
    pub async fn delete_job(ctx: &RequestContext, id: &str) -> Result<Job, ApiError> {
        let user = require_user(ctx)?;
        ctx.store().delete_job(id, &user.company_id).await?.ok_or_else(|| job_not_found(id))
    }

    #[tracing::instrument(skip(ctx))]
    pub async fn update_job(ctx: &RequestContext, input: UpdateJobInput) -> Result<Job, ApiError> {
        let user = require_user(ctx)?;
        let id = input.id.clone();
        let update = JobUpdate {
            id: input.id,
            company_id: user.company_id.clone(),
            title: input.title,
            description: input.description,
        };
        ctx.store().update_job(update).await?.ok_or_else(|| job_not_found(&id))
    }
}

impl Job {
    /// `Job.company`, resolved through the request's company loader so sibling jobs share one
    /// store round trip.
    ///
    /// The lookup is registered when this is called. It is fetched at the next
    /// [`RequestContext::flush`].
    pub fn company(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Company, ApiError>> + Send + 'static {
        let company_id = self.company_id.clone();
        let pending = ctx.company_loader.load(company_id.clone());
        async move { pending.await?.ok_or_else(|| company_not_found(&company_id)) }
    }

    /// `Job.date`: the calendar day (UTC) the job was posted, as `YYYY-MM-DD`.
    pub fn date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

impl Company {
    /// `Company.jobs`
    pub async fn jobs(&self, ctx: &RequestContext) -> Result<Vec<Job>, ApiError> {
        Ok(ctx.store().get_jobs_by_company(&self.id).await?)
    }
}
