//! Worker infrastructure - the caching proxy and its host

mod host;
mod proxy;

pub use host::{WorkerHost, WorkerStatus};
pub use proxy::InterceptionProxy;
