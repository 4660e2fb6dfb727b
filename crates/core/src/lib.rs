//! Core logic of the trip planner: conversation, prompts, model gateway,
//! snapshots and the per-traveler session.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod gateway;
pub mod persistence;
mod prompt;
mod session;
mod stats;
pub mod trip;

pub use gateway::{
    CommitError, Gateway, Reply, ReplyOutcome, UNCONFIGURED_NOTICE,
};
pub use prompt::{
    Edition, Prompt, QUICK_ACTIONS, QuickAction, UnknownEdition, build_prompt,
};
pub use session::{
    PendingTurn, PlannerSession, SessionBuilder, SessionError, TurnKind,
};
pub use stats::TripStats;
