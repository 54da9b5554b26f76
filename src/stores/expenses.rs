//! Synchronized, paginated, filterable cache of expense records.
//!
//! The store owns the one live `ExpenseCache` and is its only writer. All
//! mutations are pessimistic: nothing changes locally until the server has
//! acknowledged. Page fetches are tagged with a monotonic sequence number
//! at issue time and a response is applied only while it is still the most
//! recently issued fetch, so a slow stale page/filter combination can never
//! clobber a faster newer one.
//!
//! The bearer token is re-read from the session at every issue point -
//! logout can land while a request is suspended, and the next request must
//! see it.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::api::{ApiError, Transport};
use crate::auth::SessionState;
use crate::models::{ExpenseDraft, ExpenseFilters, ExpenseRecord};

/// Snapshot of the cached expense page plus its request status flags.
#[derive(Debug, Clone)]
pub struct ExpenseCache {
    pub items: Vec<ExpenseRecord>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub filters: ExpenseFilters,
    pub loading: bool,
    /// A create/update/delete is in flight. The UI consults this to refuse
    /// a duplicate submission; the store itself does not deduplicate.
    pub saving: bool,
    pub error: Option<String>,
}

impl Default for ExpenseCache {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_pages: 1,
            total: 0,
            filters: ExpenseFilters::default(),
            loading: false,
            saving: false,
            error: None,
        }
    }
}

/// Outcome of `ExpenseStore::update`.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The draft matched the cached record field for field; no request was
    /// issued.
    Unchanged,
    Updated(ExpenseRecord),
}

pub struct ExpenseStore<T> {
    transport: T,
    session: watch::Receiver<SessionState>,
    cache: Mutex<ExpenseCache>,
    list_seq: AtomicU64,
}

impl<T: Transport> ExpenseStore<T> {
    pub fn new(transport: T, session: watch::Receiver<SessionState>) -> Self {
        Self {
            transport,
            session,
            cache: Mutex::new(ExpenseCache::default()),
            list_seq: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ExpenseCache {
        self.cache.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.lock().loading
    }

    pub fn is_saving(&self) -> bool {
        self.cache.lock().saving
    }

    /// Clear the error banner.
    pub fn dismiss_error(&self) {
        self.cache.lock().error = None;
    }

    /// Current token at this instant. Requests issued after logout fail
    /// here without touching the transport.
    fn token(&self) -> Result<String, ApiError> {
        self.session
            .borrow()
            .token
            .clone()
            .ok_or(ApiError::Unauthorized)
    }

    /// Fetch one page of expenses matching `filters` and make it the cached
    /// page, unless a newer `list` call was issued while this one was in
    /// flight. A failed refetch keeps the previous items visible and only
    /// sets the error banner; superseded responses are dropped entirely,
    /// errors included.
    pub async fn list(&self, page: u32, filters: ExpenseFilters) -> Result<(), ApiError> {
        filters.validate()?;
        let seq = self.list_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut cache = self.cache.lock();
            cache.loading = true;
            cache.error = None;
        }

        let result = match self.token() {
            Ok(token) => self.transport.list_expenses(&token, page, &filters).await,
            Err(err) => Err(err),
        };

        let mut cache = self.cache.lock();
        if self.list_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding superseded expense page response");
            return Ok(());
        }
        cache.loading = false;
        match result {
            Ok(data) => {
                cache.items = data.expenses;
                cache.page = data.page;
                cache.total_pages = data.total_pages;
                cache.total = data.total;
                cache.filters = filters;
                Ok(())
            }
            Err(err) => {
                cache.error = Some(err.user_message("Unable to load expenses"));
                Err(err)
            }
        }
    }

    /// Create a new expense. The returned record is not spliced into the
    /// cached page - its position under the server's pagination and sort is
    /// unknown here - so the caller re-issues `list` for page 1 on success.
    pub async fn create(&self, draft: &ExpenseDraft) -> Result<ExpenseRecord, ApiError> {
        draft.validate()?;
        let token = self.token()?;
        {
            let mut cache = self.cache.lock();
            cache.saving = true;
            cache.error = None;
        }

        let result = self.transport.create_expense(&token, draft).await;

        let mut cache = self.cache.lock();
        cache.saving = false;
        match result {
            Ok(record) => Ok(record),
            Err(err) => {
                cache.error = Some(err.user_message("Failed to add expense"));
                Err(err)
            }
        }
    }

    /// Update an expense. A draft identical to the cached record is a no-op
    /// that issues zero requests. On success the matching cached record is
    /// replaced in place, preserving its position; other pages are not
    /// touched.
    pub async fn update(&self, id: &str, draft: &ExpenseDraft) -> Result<UpdateOutcome, ApiError> {
        {
            let cache = self.cache.lock();
            if let Some(existing) = cache.items.iter().find(|e| e.id == id) {
                if draft.matches(existing) {
                    debug!(id, "Update draft identical to cached record, skipping");
                    return Ok(UpdateOutcome::Unchanged);
                }
            }
        }

        draft.validate()?;
        let token = self.token()?;
        {
            let mut cache = self.cache.lock();
            cache.saving = true;
            cache.error = None;
        }

        let result = self.transport.update_expense(&token, id, draft).await;

        let mut cache = self.cache.lock();
        cache.saving = false;
        match result {
            Ok(record) => {
                if let Some(slot) = cache.items.iter_mut().find(|e| e.id == record.id) {
                    *slot = record.clone();
                }
                Ok(UpdateOutcome::Updated(record))
            }
            Err(err) => {
                cache.error = Some(err.user_message("Failed to update expense"));
                Err(err)
            }
        }
    }

    /// Delete an expense. On success the record leaves the cached page;
    /// whether the now-shorter page warrants a refetch (last item of the
    /// last page, say) is the caller's call - this store only guarantees
    /// local removal.
    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        let token = self.token()?;
        {
            let mut cache = self.cache.lock();
            cache.saving = true;
            cache.error = None;
        }

        let result = self.transport.delete_expense(&token, id).await;

        let mut cache = self.cache.lock();
        cache.saving = false;
        match result {
            Ok(()) => {
                cache.items.retain(|e| e.id != id);
                Ok(())
            }
            Err(err) => {
                cache.error = Some(err.user_message("Failed to delete expense"));
                Err(err)
            }
        }
    }

    /// Fetch the CSV export for the filtered set. No retry on failure; the
    /// error lands in the banner and the caller offers nothing to download.
    pub async fn export(&self, filters: &ExpenseFilters) -> Result<Vec<u8>, ApiError> {
        filters.validate()?;
        let token = self.token()?;
        match self.transport.export_expenses(&token, filters).await {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                self.cache.lock().error = Some(err.user_message("Failed to export expenses"));
                Err(err)
            }
        }
    }
}
