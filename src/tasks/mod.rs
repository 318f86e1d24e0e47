//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals

mod sweeper;

pub use sweeper::spawn_sweep_task;
