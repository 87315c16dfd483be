use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::mem;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use tracing_futures::Instrument;

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;
use crate::{
    batch_function::BatchFunction,
    config::{DispatchMode, LoaderConfig},
    loader_op::{BatchOutcome, LoadRequest, LoaderOp},
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts it's `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of three states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Flushing the request queue and staging keys for loading.
/// 3. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work arrives.
///
/// In state (2), the worker stages the keys of every Load request it pulls from the queue. A key
/// already staged is not staged twice, so each distinct key appears once in the batch no matter
/// how many requests share it. In `DispatchMode::Auto` the worker keeps pulling until the queue
/// is empty and stays empty across one cooperative yield, which lets callers running on the same
/// tick finish registering. That only holds on a current-thread runtime; on a multi-thread
/// runtime the caller may still be registering while the worker yields, so the batch can be cut
/// early. Use `DispatchMode::Manual` and `Loader::flush` there.
///
/// In state (3), the worker seals the staged keys into a batch and invokes its `BatchFunction`
/// with them (in chunks if `max_batch_size` is set), then resolves every pending request from the
/// result. Keys the `BatchFunction` did not return resolve to `None`. A failed call fails every
/// request of the batch, including those whose keys were in chunks that loaded fine. A
/// `Dispatch` op moves the worker into state (3) immediately, before any op queued behind it is
/// staged.
///
/// Nothing survives a batch: the next frame starts from an empty stage.
pub struct LoaderWorker<K, V, E, F, ContextT>
where
    K: 'static + Eq + Hash + Clone + Debug + Send + Sync,
    V: 'static + Send + Debug + Clone,
    E: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT, Error = E> + Send,
    ContextT: Send + Sync + 'static,
{
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V, E>>,
    config: LoaderConfig,
    keys_to_load: Vec<K>,
    staged: HashSet<K>,
    keys_requested: usize,
    pending_requests: Vec<LoadRequest<K, V, E>>,
    context: ContextT,
    phantom_batch_function: PhantomData<F>,
    debug_name: &'static str,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
}

impl<K, V, E, F, ContextT> LoaderWorker<K, V, E, F, ContextT>
where
    K: 'static + Eq + Hash + Clone + Debug + Send + Sync,
    V: 'static + Send + Debug + Clone,
    E: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT, Error = E> + Send,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V, E>>,
        context: ContextT,
        config: LoaderConfig,
    ) -> Self {
        let debug_name = std::any::type_name::<(K, V)>();
        Self {
            request_rx,
            config,
            keys_to_load: Vec::new(),
            staged: HashSet::new(),
            keys_requested: 0,
            pending_requests: Vec::new(),
            context,
            phantom_batch_function: PhantomData,
            debug_name,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(debug_name),
        }
    }

    pub async fn start(self) {
        let span = tracing::trace_span!("LoaderWorker", kv = self.debug_name);
        self.run().instrument(span).await
    }

    async fn run(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::info!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(op) => self.mux_op(op).await,
            }
            if self.config.dispatch == DispatchMode::Auto {
                self.drain_queue().await;
                self.execute_load().await;
            }
        }
    }

    /// Pulls ops until the queue is empty before and after a yield.
    async fn drain_queue(&mut self) {
        loop {
            while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
                self.mux_op(op).await;
            }
            tokio::task::yield_now().await;
            match self.request_rx.recv().now_or_never() {
                Some(Some(op)) => self.mux_op(op).await,
                _ => return,
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn mux_op(&mut self, op: LoaderOp<K, V, E>) {
        match op {
            LoaderOp::Load(request) => self.stage(request),
            LoaderOp::Dispatch => self.execute_load().await,
        }
    }

    fn stage(&mut self, request: LoadRequest<K, V, E>) {
        #[cfg(feature = "stats")]
        self.stats.record_load_request(request.keys().len() as u64);

        if request.keys().is_empty() {
            request.send_values(Vec::new());
            return;
        }
        for key in request.keys() {
            if self.staged.insert(key.clone()) {
                self.keys_to_load.push(key.clone());
            }
        }
        self.keys_requested += request.keys().len();
        tracing::debug!(requested_keys = ?request.keys(), staged = self.keys_to_load.len());
        self.pending_requests.push(request);
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        if self.pending_requests.is_empty() {
            return;
        }
        let keys = mem::take(&mut self.keys_to_load);
        let requests = mem::take(&mut self.pending_requests);
        let keys_requested = mem::take(&mut self.keys_requested);
        self.staged.clear();

        #[cfg(feature = "stats")]
        self.stats.record_dispatch(keys_requested as u64, keys.len() as u64);
        tracing::debug!(?keys, keys_requested, requests = requests.len(), "dispatching batch");

        let outcome = self.fetch(&keys).await;
        #[cfg(feature = "stats")]
        self.stats.record_dispatch_completed(outcome.as_ref().map_or(0, |l| l.len() as u64));

        for request in requests {
            request.resolve(&outcome);
        }
    }

    /// Runs the `BatchFunction` over a sealed batch, one call per chunk. The first failing chunk
    /// fails the whole batch and the remaining chunks are not fetched.
    async fn fetch(&mut self, keys: &[K]) -> BatchOutcome<K, V, E> {
        let mut loaded = HashMap::with_capacity(keys.len());
        for chunk in keys.chunks(self.config.chunk_size(keys.len())) {
            let result = F::load(chunk, &self.context).await;
            #[cfg(feature = "stats")]
            self.stats.record_fetch(result.is_ok());
            match result {
                Ok(values) => {
                    tracing::debug!(loaded = values.len(), "batch fetched");
                    loaded.extend(values);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, keys = ?chunk, "batch fetch failed");
                    return Err(e);
                }
            }
        }
        Ok(loaded)
    }
}
