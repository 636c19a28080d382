use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use super::token::TokenService;
use crate::error::AppError;
use crate::models::User;
use crate::store::Store;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Resolves the caller behind a request.
///
/// `Ok(None)` covers every way of being unauthenticated: no header, another
/// scheme, a token that does not validate, or a subject that no longer exists.
/// The user and its role are read from storage on every call, so role changes
/// and deletions take effect on the next request. `Err` is reserved for storage
/// failures.
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    store: &dyn Store,
) -> Result<Option<User>, AppError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let Some(user_id) = tokens.validate(token) else {
        return Ok(None);
    };
    store.find_user(user_id).await
}
