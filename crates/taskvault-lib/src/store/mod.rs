// ============================
// crates/taskvault-lib/src/store/mod.rs
// ============================
//! Persistence layer: owner-scoped stores over the shared pool.

pub mod tasks;
pub mod users;

pub use tasks::{NewTask, TaskStore, DEFAULT_LIST_LIMIT};
pub use users::UserDirectory;
