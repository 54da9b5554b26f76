//! reqwest-backed implementation of the SpendTrack REST API transport.
//!
//! All payload-shape normalization happens here, at the adapter boundary:
//! the server is inconsistent about wrapping (`/auth/me` answers either a
//! bare identity or `{user: {..}}`, `/admin/users` either an array or
//! `{users: [..]}`), and store logic must only ever see the canonical
//! shapes from `crate::models`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::{
    AdminStats, AdminUser, ExpenseDraft, ExpenseFilters, ExpensePage, ExpenseRecord, Identity,
};

use super::{ApiError, AuthSession, Transport};

/// HTTP request timeout in seconds.
/// The free-tier backend can take a while to wake from idle; 30s tolerates
/// that while still failing fast enough to unfreeze the session machine.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Records per page requested from the list endpoint.
const PAGE_SIZE: u32 = 10;

/// API client for the SpendTrack backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning a mapped error with the
    /// body text if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
        let response = Self::check_response(response).await?;
        Ok(response.text().await?)
    }
}

/// Accept both identity payload shapes: `{..fields}` and `{user: {..fields}}`.
fn parse_identity(text: &str) -> Result<Identity, ApiError> {
    if let Ok(identity) = serde_json::from_str::<Identity>(text) {
        return Ok(identity);
    }

    #[derive(Deserialize)]
    struct Wrapper {
        user: Identity,
    }

    serde_json::from_str::<Wrapper>(text)
        .map(|w| w.user)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse identity: {}", e)))
}

/// Accept both user-list shapes: a bare array and `{users: [..]}`.
fn parse_users(text: &str) -> Result<Vec<AdminUser>, ApiError> {
    if let Ok(users) = serde_json::from_str::<Vec<AdminUser>>(text) {
        return Ok(users);
    }

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default)]
        users: Vec<AdminUser>,
    }

    serde_json::from_str::<Wrapper>(text)
        .map(|w| w.users)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse user list: {}", e)))
}

impl Transport for HttpClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        debug!(email, "Sending login request");
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        debug!(email, "Sending registration request");
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;

        // Registration payload is collaborator-defined; only success matters.
        Self::check_response(response).await?;
        Ok(())
    }

    async fn me(&self, token: &str) -> Result<Identity, ApiError> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        parse_identity(&text)
    }

    async fn list_expenses(
        &self,
        token: &str,
        page: u32,
        filters: &ExpenseFilters,
    ) -> Result<ExpensePage, ApiError> {
        let mut query = vec![("page", page.to_string()), ("limit", PAGE_SIZE.to_string())];
        query.extend(filters.query_pairs());

        debug!(page, ?filters, "Fetching expense page");
        let response = self
            .client
            .get(self.url("/expenses"))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse expense page: {}", e)))
    }

    async fn create_expense(
        &self,
        token: &str,
        draft: &ExpenseDraft,
    ) -> Result<ExpenseRecord, ApiError> {
        let response = self
            .client
            .post(self.url("/expenses"))
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse created expense: {}", e)))
    }

    async fn update_expense(
        &self,
        token: &str,
        id: &str,
        draft: &ExpenseDraft,
    ) -> Result<ExpenseRecord, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/expenses/{}", id)))
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse updated expense: {}", e)))
    }

    async fn delete_expense(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/expenses/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn export_expenses(
        &self,
        token: &str,
        filters: &ExpenseFilters,
    ) -> Result<Vec<u8>, ApiError> {
        debug!(?filters, "Requesting CSV export");
        let response = self
            .client
            .get(self.url("/expenses/export"))
            .bearer_auth(token)
            .query(&filters.query_pairs())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn admin_stats(&self, token: &str) -> Result<AdminStats, ApiError> {
        let response = self
            .client
            .get(self.url("/admin/stats"))
            .bearer_auth(token)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse admin stats: {}", e)))
    }

    async fn admin_users(&self, token: &str) -> Result<Vec<AdminUser>, ApiError> {
        let response = self
            .client
            .get(self.url("/admin/users"))
            .bearer_auth(token)
            .send()
            .await?;

        let text = Self::read_body(response).await?;
        parse_users(&text)
    }

    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/admin/users/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }
}
