//! Shared test fakes and fixtures for the Taleforge client.

mod clock;
mod service;
mod stories;

pub use clock::FixedClock;
pub use service::{
    FailingStoryService, GatedStoryService, ScriptedStoryService, ServiceCall, completed,
    failed, status,
};
pub use stories::{branching_story, sample_story};
