//! Data models for SpendTrack entities.
//!
//! This module contains the canonical client-side data structures:
//!
//! - `Identity`, `Role`: the authenticated user
//! - `ExpenseRecord`, `ExpenseDraft`, `ExpenseFilters`: expense entries
//! - `AdminStats`, `AdminUser`: administrative statistics and accounts
//!
//! Divergent server payload shapes are normalized into these types at the
//! transport boundary; store logic only ever sees the canonical forms.

pub mod admin;
pub mod expense;
pub mod user;

pub use admin::{AdminStats, AdminUser, MonthlyTrend};
pub use expense::{
    category_totals, total_spent, CategoryTotal, ExpenseDraft, ExpenseFilters, ExpensePage,
    ExpenseRecord, SortOrder,
};
pub use user::{Identity, Role};
