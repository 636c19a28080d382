//! Authentication and authorization: bearer tokens, caller resolution and the
//! role-based access rules.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod resolver;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password, MAX_HASH_COST, MIN_HASH_COST};
pub use resolver::authenticate;
pub use token::{Claims, TokenService};

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Must be a valid email format.
    #[validate(email(message = "El formato del correo no es válido."))]
    pub correo: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria."))]
    pub contrasenia: String,
}

/// Response structure after a successful login.
///
/// The role is reported for the client's convenience but is not part of the
/// token; it is re-read from storage on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub rol: Option<String>,
}
