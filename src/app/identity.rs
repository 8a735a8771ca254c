use std::sync::Arc;

use tracing::debug;

use crate::app::store::{Store, StoreResult};
use crate::domain::user::NewUser;

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Map an external identifier to its internal key, creating the user on
    /// first sight. Profile fields only apply to the first insert.
    pub async fn resolve_or_create(&self, user: NewUser<'_>) -> StoreResult<i64> {
        if let Some(id) = self.store.find_user_id(user.external_id).await? {
            return Ok(id);
        }

        if let Some(id) = self.store.insert_user(user).await? {
            debug!(user_id = id, "registered new user");
            return Ok(id);
        }

        // A concurrent request inserted the same external id first.
        match self.store.find_user_id(user.external_id).await? {
            Some(id) => Ok(id),
            None => Err(sqlx::Error::RowNotFound.into()),
        }
    }
}
