#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Human readable name used to identify this worker stats when it is reported.
    tag: &'static str,
    /// Number of `LoaderOp::Load` that were received by the worker.
    load_requests: u64,
    /// The total number of keys that were requested for loading (not necessarily unique).
    items_requested: u64,
    /// Number of batches this worker dispatched.
    dispatches: u64,
    /// Number of `BatchFunction::load` calls, including failed ones.
    fetches: u64,
    /// Number of `BatchFunction::load` calls that returned an error.
    failed_fetches: u64,
    /// The average number of keys (not-unique) staged per dispatched batch.
    average_batch_size: f32,
    /// The max number of keys (not-unique) staged for a single batch.
    max_batch_size: u64,
    /// The min number of keys (not-unique) staged for a single batch.
    min_batch_size: u64,

    /// The max number of unique keys fetched for a single batch.
    max_batch_unique: u64,
    /// The min number of unique keys fetched for a single batch.
    min_batch_unique: u64,
    /// The total number of unique items that were actually loaded.
    items_loaded: u64,
}

impl WorkerStats {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, min_batch_size: u64::MAX, min_batch_unique: u64::MAX, ..Default::default() }
    }

    pub fn record_load_request(&mut self, items_requested: u64) {
        self.load_requests += 1;
        self.items_requested += items_requested;
    }

    pub fn record_fetch(&mut self, ok: bool) {
        self.fetches += 1;
        if !ok {
            self.failed_fetches += 1;
        }
    }

    pub fn record_dispatch(&mut self, batch_size: u64, unique_batch_size: u64) {
        let new_total = self.dispatches + 1;
        self.average_batch_size = (((self.average_batch_size as f64 * self.dispatches as f64)
            + batch_size as f64)
            / new_total as f64) as f32;
        self.dispatches = new_total;
        self.max_batch_size = self.max_batch_size.max(batch_size);
        self.min_batch_size = self.min_batch_size.min(batch_size);
        self.max_batch_unique = self.max_batch_unique.max(unique_batch_size);
        self.min_batch_unique = self.min_batch_unique.min(unique_batch_size);
    }

    pub fn record_dispatch_completed(&mut self, loaded_item_count: u64) {
        self.items_loaded += loaded_item_count;
    }
}

impl Drop for WorkerStats {
    fn drop(&mut self) {
        tracing::debug!(worker_stats = ?self);
    }
}
