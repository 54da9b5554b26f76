//! SpendTrack core - session lifecycle and resource synchronization for the
//! SpendTrack personal-finance client.
//!
//! This crate is the non-visual half of the client. It owns:
//!
//! - the authentication state machine ([`auth::SessionManager`]) that turns
//!   a persisted bearer token into a verified identity before anything
//!   protected may render
//! - the pure access decision ([`auth::route_decision`]) a navigator
//!   interprets
//! - the synchronized expense page cache ([`stores::ExpenseStore`]) and the
//!   administrative cache ([`stores::AdminStore`])
//! - the REST transport ([`api::HttpClient`]) and its test seam
//!   ([`api::Transport`])
//!
//! Rendering, routing, charts and file downloads live in the embedding
//! application; this crate hands it state snapshots and settled results,
//! never an unhandled error.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod stores;

pub use api::{ApiError, HttpClient, Transport};
pub use auth::{
    route_decision, RouteDecision, SessionManager, SessionPhase, SessionState, TokenStore,
};
pub use config::Config;
pub use stores::{AdminStore, ExpenseStore};
