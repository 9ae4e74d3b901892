//! The immutable record appended to a stream and delivered to subscribers.

use serde::{Deserialize, Serialize};

use crate::id::{now_millis, Identifier};

/// The kind of entity that produced an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Character,
    System,
    Plugin,
}

/// Who produced an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub kind: ActorKind,
    pub id: String,
}

impl Actor {
    #[must_use]
    pub fn character(id: impl Into<String>) -> Self {
        Self {
            kind: ActorKind::Character,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn system() -> Self {
        Self {
            kind: ActorKind::System,
            id: "system".to_string(),
        }
    }
}

/// The verb tag carried by an [`Event`].
///
/// `Other` keeps the tag open for verbs beyond the two built-ins without
/// breaking the wire schema when they're added; only `say`/`pose` are
/// actually produced by `holomush-engine` today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Say,
    Pose,
    Other(String),
}

impl EventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Say => "say",
            Self::Pose => "pose",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        match tag {
            "say" => Self::Say,
            "pose" => Self::Pose,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::from(String::deserialize(d)?.as_str()))
    }
}

/// An immutable record appended to exactly one stream.
///
/// `id` is the stream's sort key: ids strictly increase within a stream in
/// append order. `payload` is opaque to every component that handles it —
/// by convention a UTF-8 JSON document, but never inspected or mutated
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Identifier,
    pub stream: String,
    pub r#type: EventType,
    pub timestamp: u64,
    pub actor: Actor,
    pub payload: Vec<u8>,
}

impl Event {
    /// Construct a fresh event stamped with the current time and a new id.
    #[must_use]
    pub fn new(stream: impl Into<String>, r#type: EventType, actor: Actor, payload: Vec<u8>) -> Self {
        Self {
            id: Identifier::new(),
            stream: stream.into(),
            r#type,
            timestamp: now_millis(),
            actor,
            payload,
        }
    }
}
