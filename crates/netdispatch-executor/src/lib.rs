//! Worker-pool orchestration over a bounded queue, a capacity limiter, and
//! rate limiters, per §4.11.
//!
//! ```rust
//! use netdispatch_executor::{Executor, ExecutorConfig, SubmitOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Executor::new(ExecutorConfig::builder().num_workers(2).build())?;
//! executor.start().await?;
//! let event = executor.submit(|| async { Ok(serde_json::json!({"ok": true})) }, SubmitOptions::default()).await?;
//! executor.stop(true).await;
//! assert!(event.status().is_terminal());
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod error;
mod executor;
mod task;

pub use batch::parallel_map;
pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use error::ExecutorError;
pub use executor::{Executor, SubmitOptions};
pub use task::{DispatchOutcome, DispatchTask};
