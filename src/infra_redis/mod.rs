mod auth_session_store_redis;
mod reset_code_store_redis;

pub use auth_session_store_redis::*;
pub use reset_code_store_redis::*;
