use std::sync::Arc;

use async_trait::async_trait;

use super::error::StoreError;
use super::model::{Company, User};
use super::store::JobStore;
use crate::{BatchFunction, DispatchMode, Loader, LoaderConfig};

/// Loads companies by id through [`JobStore::get_companies`], one store call per batch.
pub struct CompanyBatch;

#[async_trait]
impl BatchFunction<String, Company> for CompanyBatch {
    type Context = Arc<dyn JobStore>;
    type Error = StoreError;

    async fn load(
        keys: &[String],
        store: &Arc<dyn JobStore>,
    ) -> Result<Vec<(String, Company)>, StoreError> {
        let companies = store.get_companies(keys).await?;
        Ok(companies.into_iter().map(|c| (c.id.clone(), c)).collect())
    }
}

pub type CompanyLoader = Loader<String, Company, StoreError>;

/// Everything one incoming operation shares across its resolvers.
///
/// Build one per request and pass it by reference; never reuse it for another request, since
/// the company loader's pending batch belongs to the request that created it.
///
/// The company loader dispatches manually: once a resolver level has registered all of its
/// `Job.company` lookups, call [`RequestContext::flush`] before awaiting them.
pub struct RequestContext {
    pub user: Option<User>,
    pub company_loader: CompanyLoader,
    store: Arc<dyn JobStore>,
}

impl RequestContext {
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn JobStore>, user: Option<User>) -> Self {
        let config = LoaderConfig::default().with_dispatch(DispatchMode::Manual);
        Self::with_loader_config(store, user, config)
    }

    pub fn with_loader_config(
        store: Arc<dyn JobStore>,
        user: Option<User>,
        config: LoaderConfig,
    ) -> Self {
        let company_loader = Loader::with_config(CompanyBatch, Arc::clone(&store), config);
        Self { user, company_loader, store }
    }

    /// Ends the current resolver level: every company lookup registered so far goes out as one
    /// batch.
    pub fn flush(&self) {
        self.company_loader.flush();
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }
}
