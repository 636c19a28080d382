use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::role::Role;

lazy_static! {
    // Names and surnames: letters and spaces only
    static ref NAME_REGEX: Regex = Regex::new(r"^[\p{L}\s]+$").unwrap();
}

/// A user as loaded from storage, role already resolved.
///
/// Carries the password hash, so it is never serialized; responses go through
/// [`UserView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Option<i32>,
    pub role: Role,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            role_id: self.role_id,
            role_name: self.role.name().map(str::to_string),
        }
    }
}

/// Public projection of a user. Credential fields are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "rolId")]
    pub role_id: Option<i32>,
    #[serde(rename = "rolNombre")]
    pub role_name: Option<String>,
}

/// Payload for provisioning a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[serde(rename = "nombre")]
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "El nombre solo puede contener letras y espacios.")
    )]
    pub name: String,

    #[serde(rename = "apellido")]
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "El apellido solo puede contener letras y espacios.")
    )]
    pub surname: String,

    #[serde(rename = "correo")]
    #[validate(email, length(max = 100))]
    pub email: String,

    #[serde(rename = "contrasenia")]
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,

    /// Missing or `0` means "assign the member role".
    #[serde(rename = "rolId", default)]
    pub role_id: Option<i32>,
}

/// Payload for replacing a user's data.
#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdateInput {
    #[serde(rename = "nombre")]
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "El nombre solo puede contener letras y espacios.")
    )]
    pub name: String,

    #[serde(rename = "apellido")]
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "El apellido solo puede contener letras y espacios.")
    )]
    pub surname: String,

    #[serde(rename = "correo")]
    #[validate(email, length(max = 100))]
    pub email: String,

    /// Absent or empty keeps the stored hash.
    #[serde(rename = "contrasenia", default)]
    #[validate(custom = "validate_replacement_password")]
    pub password: Option<String>,

    /// Absent keeps the current role.
    #[serde(rename = "rolId", default)]
    pub role_id: Option<i32>,
}

impl UserUpdateInput {
    /// The new password, if one was actually supplied.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

fn validate_replacement_password(password: &String) -> Result<(), ValidationError> {
    if password.is_empty() || password.chars().count() >= 6 {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some("La contraseña debe tener al menos 6 caracteres.".into());
    Err(err)
}

/// A user ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
}

/// Replacement values for an existing user.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub surname: String,
    pub email: String,
    /// `None` keeps the stored hash.
    pub password_hash: Option<String>,
    /// `None` keeps the stored role.
    pub role_id: Option<i32>,
}
