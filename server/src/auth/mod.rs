mod crypto;
mod db;
mod extractor;

pub use crypto::{hash_password, verify_password};
pub use db::{create_session, delete_session, delete_user_sessions, SessionError};
pub use extractor::{parse_authorization, AuthError, AuthUser, CurrentSession, MaybeAuthUser};
