mod batch_function;
pub mod board;
mod config;
mod error;
mod loader;
mod loader_op;
mod loader_worker;
#[cfg(feature = "stats")]
mod worker_stats;

pub use batch_function::BatchFunction;
pub use config::{DispatchMode, LoaderConfig};
pub use error::LoadError;
pub use loader::Loader;
pub use loader_op::{LoadManyResult, LoadResult};
