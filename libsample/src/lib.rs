//! This is a library for storing samples and their translations in a
//! relational database.
//!
//! The [sample::SampleRepository] owns all SQL for the sample tables, and
//! [sample::SampleService] wraps it with transaction and deadline handling.
//! Every failure is reported as an [Error] that can be classified with
//! [Error::kind()].

pub mod core;
pub mod sample;

pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
