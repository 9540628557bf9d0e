//! Performance Module
//!
//! Multi-core utilization for per-chapter import and timing generation.

pub mod parallel;

pub use parallel::{ChapterPool, ParallelConfig, PoolStats};
