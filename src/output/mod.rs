//! Console output of the samples.
//!
//! - [`terminal`] - Step, success and failure lines, resource name lists

mod terminal;

pub use terminal::{failure, format_names, print_names, step, success};
