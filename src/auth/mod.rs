//! Authentication module: session lifecycle, route guarding, and token
//! persistence.
//!
//! This module provides:
//! - `SessionManager`: the three-phase authentication state machine
//! - `route_decision`: pure access decisions over the observed session state
//! - `TokenStore`: durable bearer-token persistence (keychain or file)
//!
//! The persisted token survives restarts; a fresh process starts Resolving
//! and hydrates it into a verified identity before protected views render.

pub mod credentials;
pub mod guard;
pub mod session;

pub use credentials::{FileTokenStore, KeyringTokenStore, TokenStore};
pub use guard::{route_decision, RouteDecision};
pub use session::{SessionManager, SessionPhase, SessionState};
