//! Fixed-capacity work queue with backpressure and a worker pool, per §4.5.
//!
//! ```rust
//! use netdispatch_queue::{BoundedWorkQueue, QueueConfig};
//!
//! # async fn example() {
//! let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(QueueConfig::builder().capacity(16).build().unwrap());
//! queue.start().await;
//! queue
//!     .start_workers(
//!         |item: &i32| {
//!             let item = *item;
//!             async move { println!("processed {item}"); Ok::<(), String>(()) }
//!         },
//!         4,
//!         None::<fn(String, &i32) -> std::future::Ready<()>>,
//!     )
//!     .await
//!     .unwrap();
//!
//! queue.put(42, None).await.unwrap();
//! queue.join().await;
//! # }
//! ```

mod config;
mod error;
mod events;
mod queue;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use error::QueueError;
pub use events::QueueEvent;
pub use queue::{BoundedWorkQueue, QueueMetrics, QueueStatus};
