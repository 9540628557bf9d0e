//! VerseSync Core Library
//!
//! Timing synchronization engine for narrated scripture videos.
//! Turns per-chapter timing annotations and verse text into segments, and
//! segments into per-word caption timelines for the renderer.
//!
//! ## Pipelines
//!
//! - Import: timing file + verse text -> [`core::project::Segment`]s
//!   (see [`core::timing::SegmentBuilder`] and [`core::import::ProjectImporter`]).
//! - Render prep: [`core::project::Chapter`] -> [`core::captions::Timing`]s
//!   (see [`core::captions::chapter_to_timings`]).

pub mod core;

pub use crate::core::{CoreError, CoreResult};
