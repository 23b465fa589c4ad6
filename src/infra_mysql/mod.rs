mod account_repo_mysql;
mod auth_repo_mysql;
mod user_repo_mysql;

pub use account_repo_mysql::*;
pub use auth_repo_mysql::*;
pub use user_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;
