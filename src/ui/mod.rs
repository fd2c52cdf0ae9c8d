//! Terminal presentation: spinners, progress labels and response output.

mod output;
mod spinner;

pub use output::*;
pub use spinner::*;
