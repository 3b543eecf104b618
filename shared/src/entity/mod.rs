pub mod concurrency_strategy;
pub mod error;
