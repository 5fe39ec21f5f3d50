//! Taleforge Core — shared domain abstractions.
//!
//! This crate defines the story graph, the generation job, and the
//! `StoryGenerationService` seam that the session and navigator crates depend
//! on. It contains no transport code.

pub mod clock;
pub mod error;
pub mod ids;
pub mod job;
pub mod service;
pub mod story;
pub mod theme;
