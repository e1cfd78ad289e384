//! Core infrastructure for accessing the sample database.
pub mod database;
pub mod error;
pub mod query;
