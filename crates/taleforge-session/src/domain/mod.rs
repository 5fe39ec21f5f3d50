//! Domain layer for the Session context.

pub mod error;
pub mod events;
pub mod phase;
pub mod state;
