mod auth_service_impl;
mod credential_hasher_argon2;
mod mailer_log;
mod password_reset_service_impl;
mod relationship_service_impl;
mod token_codec_jwt;
mod user_service_impl;
mod validation;

pub use auth_service_impl::*;
pub use credential_hasher_argon2::*;
pub use mailer_log::*;
pub use password_reset_service_impl::*;
pub use relationship_service_impl::*;
pub use token_codec_jwt::*;
pub use user_service_impl::*;
pub use validation::*;
