// crates/taskvault-lib/src/handlers/mod.rs

//! HTTP request handlers.

pub mod auth;
pub mod tasks;
