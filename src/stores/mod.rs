//! Resource stores: the synchronized client-side caches behind the views.
//!
//! Each store owns one cache, is its only writer, and reads the current
//! bearer token from the session at the moment it issues a request. All
//! mutations are pessimistic - the cache changes only after the server
//! acknowledges.
//!
//! - `ExpenseStore`: paginated/filtered expense page with CRUD and export
//! - `AdminStore`: cross-user statistics and the managed user list

pub mod admin;
pub mod expenses;

pub use admin::{AdminCache, AdminStore};
pub use expenses::{ExpenseCache, ExpenseStore, UpdateOutcome};
