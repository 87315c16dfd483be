use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::ops::Drop;

use tokio::sync::{mpsc, oneshot};

use crate::{
    batch_function::BatchFunction,
    config::LoaderConfig,
    error::LoadError,
    loader_op::{LoadManyResult, LoadRequest, LoadResult, LoaderOp},
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users call [`Loader::load`] and [`Loader::load_many`] to register keys for the current batch.
/// Every distinct key registered before the dispatch boundary is fetched exactly once, with one
/// call to the [`BatchFunction`], and the result is fanned out to every caller that asked for it.
/// The boundary is either automatic (see [`DispatchMode::Auto`]) or an explicit
/// [`Loader::flush`].
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. The loader enqueues the
/// requested operations on the request queue for processing by its `LoaderWorker`, which owns all
/// pending state and provides results via response oneshot channels back to the callers.
///
/// A loader is meant to live for one logical request: construct it when the request starts,
/// share it by reference with every resolver, and drop it when the request ends. Dropping the
/// loader stops its worker; callers still waiting receive [`LoadError::WorkerClosed`].
///
/// [`DispatchMode::Auto`]: crate::DispatchMode::Auto
pub struct Loader<K, V, E>
where
    K: 'static + Eq + Hash + Clone + Debug + Send + Sync,
    V: 'static + Send + Debug + Clone,
    E: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V, E>>,
    load_task_handle: tokio::task::JoinHandle<()>,
}

impl<K, V, E> Drop for Loader<K, V, E>
where
    K: 'static + Eq + Hash + Clone + Debug + Send + Sync,
    V: 'static + Send + Debug + Clone,
    E: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V, E> Loader<K, V, E>
where
    K: 'static + Eq + Hash + Clone + Debug + Send + Sync,
    V: 'static + Send + Debug + Clone,
    E: 'static + Send + Debug + Clone,
{
    /// Creates a new Loader for the provided BatchFunction and Context type with the default
    /// [`LoaderConfig`].
    ///
    /// Note: the batch function is passed in as a marker for type inference. Must be called from
    /// within a tokio runtime.
    pub fn new<F, ContextT>(batch_function: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT, Error = E> + Send,
    {
        Self::with_config(batch_function, context, LoaderConfig::default())
    }

    pub fn with_config<F, ContextT>(_: F, context: ContextT, config: LoaderConfig) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT, Error = E> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            request_tx: tx,
            load_task_handle: tokio::task::spawn(
                LoaderWorker::<K, V, E, F, ContextT>::new(rx, context, config).start(),
            ),
        }
    }

    /// Loads a value from the underlying resource.
    ///
    /// The key is registered in the current batch when this method is called, not when the
    /// returned future is first polled. The future resolves to `Ok(None)` if the BatchFunction
    /// did not return a value for the key, and to `Err(LoadError::Fetch(_))` if the batch failed.
    pub fn load(&self, key: K) -> impl Future<Output = LoadResult<V, E>> + Send + 'static {
        let (response_tx, response_rx) = oneshot::channel();
        let queued = self.enqueue(LoaderOp::Load(LoadRequest::One(key, response_tx)));
        async move {
            if !queued {
                return Err(LoadError::WorkerClosed);
            }
            response_rx.await.unwrap_or(Err(LoadError::WorkerClosed))
        }
    }

    /// Loads many values at once.
    ///
    /// The result is positionally aligned with `keys`, with `None` for values the BatchFunction
    /// did not return. If the fetch of any of the keys failed the whole call fails.
    pub fn load_many(
        &self,
        keys: Vec<K>,
    ) -> impl Future<Output = LoadManyResult<V, E>> + Send + 'static {
        let (response_tx, response_rx) = oneshot::channel();
        let queued = self.enqueue(LoaderOp::Load(LoadRequest::Many(keys, response_tx)));
        async move {
            if !queued {
                return Err(LoadError::WorkerClosed);
            }
            response_rx.await.unwrap_or(Err(LoadError::WorkerClosed))
        }
    }

    /// Seals every key registered so far into one batch and fetches it. Keys registered after
    /// this call go into the next batch.
    pub fn flush(&self) {
        if !self.enqueue(LoaderOp::Dispatch) {
            tracing::warn!("flush called on a stopped loader");
        }
    }

    fn enqueue(&self, op: LoaderOp<K, V, E>) -> bool {
        self.request_tx.send(op).is_ok()
    }
}
