//! Session and token handling
//!
//! Provides:
//! - JWT payload inspection and the renewal-window check
//! - The in-memory `Session` entity (token + cached user)
//! - Persistent session storage (file-backed and in-memory)

pub mod session;
pub mod storage;
pub mod token;

pub use session::Session;
pub use storage::{
    FileSessionStorage, MemorySessionStorage, SessionStorage, StorageError, TOKEN_KEY, USER_KEY,
};
pub use token::{decode_claims, expires_within, TokenClaims};
