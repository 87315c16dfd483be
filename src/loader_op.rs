use std::collections::HashMap;
use std::hash::Hash;
use std::slice;

use tokio::sync::oneshot;

use crate::error::LoadError;

pub type LoadResult<V, E> = Result<Option<V>, LoadError<E>>;
pub type LoadManyResult<V, E> = Result<Vec<Option<V>>, LoadError<E>>;

/// Set of possible requests that can be sent to the [`LoaderWorker`]
///
/// [`LoaderWorker`]: crate::loader_worker::LoaderWorker
#[derive(Debug)]
pub enum LoaderOp<K, V, E> {
    /// Register keys in the current batch.
    Load(LoadRequest<K, V, E>),
    /// Seal the current batch and fetch it before handling any later op.
    Dispatch,
}

#[derive(Debug)]
pub enum LoadRequest<K, V, E> {
    One(K, oneshot::Sender<LoadResult<V, E>>),
    Many(Vec<K>, oneshot::Sender<LoadManyResult<V, E>>),
}

/// What one dispatch produced: every loaded value, or the error that failed the batch.
pub type BatchOutcome<K, V, E> = Result<HashMap<K, V>, E>;

impl<K, V, E> LoadRequest<K, V, E>
where
    K: Eq + Hash,
    V: Clone,
    E: Clone,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Resolves this request from a finished batch.
    pub fn resolve(self, outcome: &BatchOutcome<K, V, E>) {
        match outcome {
            Ok(loaded) => {
                let values =
                    self.keys().iter().map(|k| loaded.get(k).cloned()).collect::<Vec<_>>();
                self.send_values(values);
            }
            Err(e) => self.fail(LoadError::Fetch(e.clone())),
        }
    }

    pub fn send_values(self, values: Vec<Option<V>>) {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = values.into_iter().next().flatten();
                if response_tx.send(Ok(response)).is_err() {
                    tracing::warn!("receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                if response_tx.send(Ok(values)).is_err() {
                    tracing::warn!("receiver dropped");
                }
            }
        }
    }

    pub fn fail(self, error: LoadError<E>) {
        let sent = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error)).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error)).is_ok(),
        };
        if !sent {
            tracing::warn!("receiver dropped");
        }
    }
}
