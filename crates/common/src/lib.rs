//! Shared types and error machinery used across all `holomush` crates.

pub mod context;
pub mod error;
pub mod event;
pub mod id;

pub use {
    context::RequestContext,
    error::{Error, FromMessage, Result},
    event::{Actor, ActorKind, Event, EventType},
    id::Identifier,
};
