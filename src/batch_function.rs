use async_trait::async_trait;

/// A `BatchFunction` defines the method through which some `Loader` fetches batched data from
/// some resource. The `BatchFunction` receives the deduplicated keys that were registered during
/// the `Loader`'s most recent batch, and some user defined context struct.
///
/// Unlike the reference facebook dataloader implementation, the `BatchFunction` is not required
/// to return a pair for every key it was given. It can return any set of loaded key
/// value pairs, in any order it chooses. Requesters of keys whose values are not returned
/// receive `None`, the absence marker.
///
/// Returning `Err` fails the whole batch: every caller waiting on it receives a clone of the
/// same error. The loader never retries; the next `load` starts a fresh batch.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    type Error;

    async fn load(keys: &[K], context: &Self::Context) -> Result<Vec<(K, V)>, Self::Error>;
}
