//! pxr-testkit
//!
//! Test-only fakes for the admin interface. Scenario tests covering the
//! reconcile engine end to end live under `tests/`.

mod admin;
pub mod tables;

pub use admin::{cell, stored, InMemoryAdmin};
