mod account;
mod profile;
mod relation;
mod user;

pub use account::*;
pub use profile::*;
pub use relation::*;
pub use user::*;
