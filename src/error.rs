use thiserror::Error;

/// Failure delivered to a caller awaiting a `Loader::load` or `Loader::load_many`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError<E> {
    /// The `BatchFunction` failed for the batch this request joined. Every caller in that batch
    /// receives a clone of the same error.
    #[error("batch fetch failed: {0}")]
    Fetch(E),
    /// The worker task stopped before the request was resolved (e.g. the `Loader` was dropped).
    #[error("loader worker is no longer running")]
    WorkerClosed,
}
