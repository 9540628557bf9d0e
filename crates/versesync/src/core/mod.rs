//! VerseSync Core Engine
//!
//! Handles segment building from timing annotations, caption timing generation,
//! chapter assembly for each project source, and chapter-parallel import.

pub mod captions;
pub mod import;
pub mod performance;
pub mod project;
pub mod settings;
pub mod sources;
pub mod timing;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
