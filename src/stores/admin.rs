//! Read-mostly cache of administrative statistics and the user list.
//!
//! Role enforcement is upstream: the route guard keeps non-admins away from
//! the views that drive this store, and the store does not re-check. The
//! three operations are independent - each has its own in-flight flag and
//! error field, so a failing stats fetch neither blocks nor clears a loaded
//! user list.

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::api::{ApiError, Transport};
use crate::auth::SessionState;
use crate::models::{AdminStats, AdminUser};

#[derive(Debug, Clone, Default)]
pub struct AdminCache {
    pub stats: Option<AdminStats>,
    pub users: Vec<AdminUser>,
    pub stats_loading: bool,
    pub users_loading: bool,
    pub deleting: bool,
    pub stats_error: Option<String>,
    pub users_error: Option<String>,
    pub delete_error: Option<String>,
}

pub struct AdminStore<T> {
    transport: T,
    session: watch::Receiver<SessionState>,
    cache: Mutex<AdminCache>,
}

impl<T: Transport> AdminStore<T> {
    pub fn new(transport: T, session: watch::Receiver<SessionState>) -> Self {
        Self {
            transport,
            session,
            cache: Mutex::new(AdminCache::default()),
        }
    }

    pub fn snapshot(&self) -> AdminCache {
        self.cache.lock().clone()
    }

    fn token(&self) -> Result<String, ApiError> {
        self.session
            .borrow()
            .token
            .clone()
            .ok_or(ApiError::Unauthorized)
    }

    /// Replace the cached statistics wholesale. On failure the previous
    /// snapshot stays visible behind the error message.
    pub async fn load_stats(&self) -> Result<(), ApiError> {
        {
            let mut cache = self.cache.lock();
            cache.stats_loading = true;
            cache.stats_error = None;
        }

        let result = match self.token() {
            Ok(token) => self.transport.admin_stats(&token).await,
            Err(err) => Err(err),
        };

        let mut cache = self.cache.lock();
        cache.stats_loading = false;
        match result {
            Ok(stats) => {
                cache.stats = Some(stats);
                Ok(())
            }
            Err(err) => {
                cache.stats_error = Some(err.user_message("Unable to load admin stats"));
                Err(err)
            }
        }
    }

    /// Replace the cached user list wholesale; same failure contract as
    /// `load_stats`.
    pub async fn load_users(&self) -> Result<(), ApiError> {
        {
            let mut cache = self.cache.lock();
            cache.users_loading = true;
            cache.users_error = None;
        }

        let result = match self.token() {
            Ok(token) => self.transport.admin_users(&token).await,
            Err(err) => Err(err),
        };

        let mut cache = self.cache.lock();
        cache.users_loading = false;
        match result {
            Ok(users) => {
                cache.users = users;
                Ok(())
            }
            Err(err) => {
                cache.users_error = Some(err.user_message("Unable to load users"));
                Err(err)
            }
        }
    }

    /// Delete a user account. On success the matching row leaves the cached
    /// list; no re-fetch is triggered. Callers must have checked
    /// `AdminUser::deletable` - administrator rows are never offered for
    /// deletion upstream.
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let token = self.token()?;
        {
            let mut cache = self.cache.lock();
            cache.deleting = true;
            cache.delete_error = None;
        }

        let result = self.transport.delete_user(&token, id).await;

        let mut cache = self.cache.lock();
        cache.deleting = false;
        match result {
            Ok(()) => {
                cache.users.retain(|u| u.id != id);
                debug!(id, "Removed user from cached list");
                Ok(())
            }
            Err(err) => {
                cache.delete_error = Some(err.user_message("Unable to delete user"));
                Err(err)
            }
        }
    }
}
