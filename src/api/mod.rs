//! REST API transport for the SpendTrack backend.
//!
//! This module provides the `Transport` trait - the seam the session
//! machine and resource stores depend on - together with `HttpClient`,
//! its reqwest implementation, and the `ApiError` taxonomy.
//!
//! The API uses bearer token authentication obtained through the
//! `/auth/login` endpoint.

pub mod client;
pub mod error;
pub mod transport;

pub use client::HttpClient;
pub use error::ApiError;
pub use transport::{AuthSession, Transport};
