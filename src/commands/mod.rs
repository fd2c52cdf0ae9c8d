//! Command registry, resolution and dispatch.
//!
//! Includes:
//! - `registry`: built-in commands and discovered APIs.
//! - `resolver`: token to command resolution and required-argument checks.
//! - `dispatch`: request handling and response routing.

mod dispatch;
mod registry;
mod resolver;

pub use dispatch::*;
pub use registry::*;
pub use resolver::*;
