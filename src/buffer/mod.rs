pub mod batch;
pub mod batcher;

pub use batch::{Batch, BatchConfig, BatchType};
pub use batcher::EventBatcher;
