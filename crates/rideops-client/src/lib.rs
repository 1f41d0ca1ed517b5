//! RideOps Client Library
//!
//! This crate provides the session-aware API client for the RideOps dispatch
//! platform: bearer-token lifecycle, transparent pre-expiry renewal, and
//! session-expiry signaling for the rest of the application.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod events;

// Re-export commonly used types
pub use auth::{FileSessionStorage, MemorySessionStorage, Session, SessionStorage, StorageError};
pub use client::{ApiClient, AuthResponse, RequestOptions};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use events::{EventBus, SessionEvent};
