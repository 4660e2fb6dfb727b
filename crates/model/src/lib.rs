//! An abstraction layer for hosted chat models.
//!
//! This crate establishes the protocol the planner uses to talk to a
//! chat-completion endpoint, so that the session logic never depends on
//! a particular vendor. A request replays the whole conversation every
//! time, and a response is a finite stream of events.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
