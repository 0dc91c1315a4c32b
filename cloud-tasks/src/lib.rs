//! Cloud Tasks publisher and the fan-out engine controllers use to push
//! hundreds of thousands of tasks without losing track of failures. Rate
//! control lives entirely in the queues: per-region subqueues carry a share
//! of the per-region API quota as their dispatch rate.

mod error;
mod fanout;
mod publisher;

pub use error::QueueError;
pub use fanout::CHUNK_SIZE;
pub use fanout::SUBMIT_CONCURRENCY;
pub use fanout::SubmitReport;
pub use fanout::submit_all;
pub use publisher::QUEUE_WARMUP;
pub use publisher::TaskPublisher;
pub use publisher::subqueue_name;
