// store

mod auth_session_store;
mod reset_code_store;

pub use auth_session_store::*;
pub use reset_code_store::*;

// repo

mod account_repo;
mod auth_repo;
mod user_repo;

mod repo_tx;

pub use account_repo::*;
pub use auth_repo::*;
pub use user_repo::*;

pub use repo_tx::*;

// outbound

mod mailer;

pub use mailer::*;
