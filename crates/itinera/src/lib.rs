//! A terminal trip planner backed by a hosted chat model.
//!
//! The crate includes a CLI tool for using in the terminal. The pieces it
//! is built from (form collector, command parser, renderer and
//! configuration) are exposed as a library as well.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod commands;
pub mod config;
pub mod form;
pub mod render;

pub use commands::{Command, CommandError, Feedback};
pub use config::Config;
pub use form::{FieldError, FormCollector};

/// Re-exports of [`itinera_core`] crate.
pub mod core {
    pub use itinera_core::*;
}
