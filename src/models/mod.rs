//! Defines the data structures and models used throughout the application.
//!
//! This includes the generic API response map and the typed upload-credential
//! record decoded from it.

mod response;

pub use response::*;
