//! Application layer for the Session context.

pub mod config;
pub mod controller;
pub mod query_handlers;
