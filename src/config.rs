use std::num::NonZeroUsize;

/// Decides when a `LoaderWorker` seals its pending keys into a batch and runs the
/// `BatchFunction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Dispatch once the request queue has drained and a cooperative yield brings no further
    /// registrations. Explicit `Loader::flush` calls are honoured as well.
    ///
    /// The yield is only a reliable end-of-registration signal on a current-thread runtime.
    /// On a multi-thread runtime the worker can run while the caller is still registering keys,
    /// splitting them over several batches.
    #[default]
    Auto,
    /// Dispatch only when `Loader::flush` is called. Batches are then independent of how the
    /// runtime schedules the worker.
    Manual,
}

/// Per-loader settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    pub dispatch: DispatchMode,
    /// Upper bound on distinct keys handed to a single `BatchFunction::load` call. `None` means a
    /// batch is always fetched in one call. A batch split into several calls still succeeds or
    /// fails as a whole.
    pub max_batch_size: Option<NonZeroUsize>,
}

impl LoaderConfig {
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = NonZeroUsize::new(max_batch_size);
        self
    }

    /// Number of keys per `BatchFunction` call for a batch of `batch_len` distinct keys.
    pub(crate) fn chunk_size(&self, batch_len: usize) -> usize {
        self.max_batch_size.map_or(batch_len, NonZeroUsize::get).max(1)
    }
}
