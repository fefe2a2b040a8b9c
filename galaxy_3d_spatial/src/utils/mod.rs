//! Utility types shared across the spatial subsystem.

mod worker_pool;

pub use worker_pool::WorkerPool;
