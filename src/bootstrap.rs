//! Reference data every deployment needs: both roles and a first administrator.

use log::info;

use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::{NewUser, User, ADMIN_ROLE_NAME, MEMBER_ROLE_NAME};
use crate::store::Store;

/// Credentials of the administrator created on first start.
#[derive(Debug, Clone)]
pub struct DefaultAdmin {
    pub email: String,
    pub password: String,
}

/// Ensures the roles and the default administrator exist. Safe to run on every
/// start; an existing administrator is left untouched.
pub async fn seed_defaults(
    store: &dyn Store,
    admin: &DefaultAdmin,
    password_cost: u32,
) -> Result<User, AppError> {
    let admin_role = store.ensure_role(ADMIN_ROLE_NAME).await?;
    store.ensure_role(MEMBER_ROLE_NAME).await?;

    if let Some(existing) = store.find_user_by_email(&admin.email).await? {
        return Ok(existing);
    }

    let user = store
        .insert_user(NewUser {
            name: "Admin".to_string(),
            surname: "Principal".to_string(),
            email: admin.email.clone(),
            password_hash: hash_password(&admin.password, password_cost)?,
            role_id: admin_role.id,
        })
        .await?;
    info!("Created default administrator {}", user.email);
    Ok(user)
}
