//! Provides clients and utilities for executing management API calls.
//!
//! Includes:
//! - `invoker`: the `ApiInvoker` trait the dispatcher calls through.
//! - `http`: a reqwest-backed implementation.

mod http;
mod invoker;

pub use http::*;
pub use invoker::*;
