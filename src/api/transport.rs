//! The transport seam between stores and the SpendTrack REST API.
//!
//! Session and store logic depends on this trait rather than on a concrete
//! HTTP client, so the whole synchronization layer can be exercised against
//! in-memory transports in tests. The bearer token is passed explicitly on
//! every call: callers must read the current token at the moment a request
//! is issued, never hold one across an await.

use serde::Deserialize;

use crate::models::{AdminStats, AdminUser, ExpenseDraft, ExpenseFilters, ExpensePage, ExpenseRecord, Identity};

use super::ApiError;

/// Successful login payload: a fresh bearer token plus the account it proves.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: Identity,
}

// Callers run on a single logical task; no Send bound is required on the
// returned futures.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;

    /// `POST /auth/register` - creates the account, does not authenticate.
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError>;

    /// `GET /auth/me` - resolve a bearer token into its identity.
    async fn me(&self, token: &str) -> Result<Identity, ApiError>;

    /// `GET /expenses` - one page of records matching the filters.
    async fn list_expenses(
        &self,
        token: &str,
        page: u32,
        filters: &ExpenseFilters,
    ) -> Result<ExpensePage, ApiError>;

    /// `POST /expenses` - returns the persisted record.
    async fn create_expense(
        &self,
        token: &str,
        draft: &ExpenseDraft,
    ) -> Result<ExpenseRecord, ApiError>;

    /// `PUT /expenses/{id}` - returns the persisted record.
    async fn update_expense(
        &self,
        token: &str,
        id: &str,
        draft: &ExpenseDraft,
    ) -> Result<ExpenseRecord, ApiError>;

    /// `DELETE /expenses/{id}`
    async fn delete_expense(&self, token: &str, id: &str) -> Result<(), ApiError>;

    /// `GET /expenses/export` - CSV bytes for the filtered set.
    async fn export_expenses(
        &self,
        token: &str,
        filters: &ExpenseFilters,
    ) -> Result<Vec<u8>, ApiError>;

    /// `GET /admin/stats`
    async fn admin_stats(&self, token: &str) -> Result<AdminStats, ApiError>;

    /// `GET /admin/users`
    async fn admin_users(&self, token: &str) -> Result<Vec<AdminUser>, ApiError>;

    /// `DELETE /admin/users/{id}`
    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ApiError>;
}
