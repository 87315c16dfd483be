//! Job board: companies, their job postings, and the resolvers serving them.
//!
//! `Job.company` is resolved through a per-request [`CompanyLoader`], so listing N jobs costs
//! one company fetch per batch instead of one per job.

mod context;
mod error;
mod model;
pub mod resolvers;
mod store;
pub mod views;

pub use context::{CompanyBatch, CompanyLoader, RequestContext};
pub use error::{ApiError, StoreError};
pub use model::{
    Company, CreateJobInput, Job, JobUpdate, JobsPage, NewJob, UpdateJobInput, User,
};
pub use store::{JobStore, MemoryStore};
