//! Application layer for the Story Navigation context.

pub mod query_handlers;
