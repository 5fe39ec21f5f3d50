//! Domain layer for the Story Navigation context.

pub mod error;
pub mod navigator;
