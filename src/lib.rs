#![doc = "The `gestor_tareas` library crate."]
#![doc = ""]
#![doc = "Task management backend: bearer-token authentication, role-based authorization"]
#![doc = "and role-scoped CRUD over tasks and users. The binary (`main.rs`) wires these"]
#![doc = "modules into an Actix Web server backed by PostgreSQL."]

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
