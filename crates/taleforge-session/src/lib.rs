//! Taleforge — Session context.
//!
//! Drives one story generation session: submits the theme, polls the
//! generation job until it is terminal, loads the finished story into a
//! navigator, and forwards the player's intents to it.

pub mod application;
pub mod domain;
