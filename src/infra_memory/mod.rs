//! Process-local implementations of every store port, backed by `dashmap`.
//! Selected with `store.backend = "memory"`; the test suites run against it.

mod auth_session_store_memory;
mod repo_tx_memory;
mod reset_code_store_memory;
mod store_memory;

pub use auth_session_store_memory::*;
pub use repo_tx_memory::*;
pub use reset_code_store_memory::*;
pub use store_memory::*;
