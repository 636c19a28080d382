use std::sync::Arc;

use crate::auth::TokenService;
use crate::store::Store;

/// Shared, read-only application state handed to every worker.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    /// bcrypt work factor used when hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, password_cost: u32) -> Self {
        Self {
            store,
            tokens,
            password_cost,
        }
    }
}
