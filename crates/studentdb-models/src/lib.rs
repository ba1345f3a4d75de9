//! # studentdb Models
//!
//! Domain models and DTOs shared by the API, the storage layer and the CLI.

pub mod auth;
pub mod import;
pub mod students;
