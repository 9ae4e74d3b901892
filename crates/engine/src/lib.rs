//! Verb handlers (component G, spec §4.G): turns a parsed command into the
//! `Event` that gets appended to the store and broadcast to subscribers.
//!
//! Command parsing itself — splitting on whitespace, lowercasing the verb,
//! the `:` alias for `pose` — lives in `holomush-server`, which consults
//! [`KNOWN_VERBS`] before dispatching here.

pub mod error;

use holomush_common::{Actor, Event, EventType};
pub use error::{Error, Result};
use serde::Serialize;

/// Every verb this engine understands, in the order command help should
/// list them.
pub const KNOWN_VERBS: &[&str] = &["say", "pose"];

#[derive(Serialize)]
struct MessagePayload<'a> {
    message: &'a str,
}

fn encode_payload(payload: &impl Serialize) -> Vec<u8> {
    // Serializing our own well-formed structs never fails.
    serde_json::to_vec(payload).unwrap_or_default()
}

/// `say <message>` — a character speaking on `stream`.
pub fn handle_say(actor: Actor, stream: impl Into<String>, message: &str) -> Result<Event> {
    let message = message.trim();
    if message.is_empty() {
        return Err(Error::EmptyArgument);
    }
    let payload = encode_payload(&MessagePayload { message });
    Ok(Event::new(stream, EventType::Say, actor, payload))
}

/// `pose <action>` (alias `:<action>`) — a character performing an action
/// described in third person on `stream`.
pub fn handle_pose(actor: Actor, stream: impl Into<String>, action: &str) -> Result<Event> {
    let action = action.trim();
    if action.is_empty() {
        return Err(Error::EmptyArgument);
    }
    let payload = encode_payload(&MessagePayload { message: action });
    Ok(Event::new(stream, EventType::Pose, actor, payload))
}

/// Dispatch a lowercased verb to its handler. Returns
/// [`Error::UnknownVerb`] for anything outside [`KNOWN_VERBS`].
pub fn dispatch(verb: &str, actor: Actor, stream: impl Into<String>, argument: &str) -> Result<Event> {
    match verb {
        "say" => handle_say(actor, stream, argument),
        "pose" => handle_pose(actor, stream, argument),
        other => Err(Error::UnknownVerb(other.to_string())),
    }
}
