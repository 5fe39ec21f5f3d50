//! Taleforge — HTTP client for the story generation service.
//!
//! Implements `StoryGenerationService` over the service's JSON API and
//! provides the configuration and tracing setup an embedding application
//! needs.

pub mod config;
pub mod dto;
pub mod http;
pub mod telemetry;

pub use config::{ClientConfig, ConfigError};
pub use http::HttpStoryService;
