//! Fixed-size thread pool with result handles and delayed execution
//!
//! # Features
//! - Fixed number of OS worker threads sharing one FIFO queue
//! - `submit` returns a [`JoinHandle`] that can be joined, polled or awaited
//! - `schedule` runs a task no earlier than a given delay
//! - Panics in tasks are caught and reported through the handle
//! - Idempotent `shutdown` that stops workers without draining the queue
//! - Pool metrics snapshot
//!
//! ```no_run
//! use std::time::Duration;
//! use thread_ext::ThreadPool;
//!
//! let pool = ThreadPool::new(4).unwrap();
//! let answer = pool.submit(|| 6 * 7).unwrap();
//! let later = pool.schedule(|| "later", Duration::from_millis(10)).unwrap();
//!
//! assert_eq!(answer.join(), Ok(42));
//! assert_eq!(later.join(), Ok("later"));
//! pool.shutdown();
//! ```

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use errors::SpawnError;
pub use handle::JoinHandle;
pub use model::PoolMetrics;
pub use pool::{Config, ThreadPool};
pub use result::SpawnResult;
