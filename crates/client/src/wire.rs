//! The client-side half of the wire/domain conversion — the inverse of
//! `holomush_server`'s (spec §6).

use holomush_common::{Actor, ActorKind, Event, EventType, Identifier};
use holomush_protocol::WireEvent;

use crate::error::{Error, Result};

pub fn from_wire_event(wire: WireEvent) -> Result<Event> {
    let id: Identifier = wire
        .id
        .parse()
        .map_err(|_| Error::message(format!("malformed event id: {}", wire.id)))?;
    let kind = match wire.actor_type.as_str() {
        "character" => ActorKind::Character,
        "system" => ActorKind::System,
        "plugin" => ActorKind::Plugin,
        other => return Err(Error::message(format!("unknown actor type: {other}"))),
    };
    Ok(Event {
        id,
        stream: wire.stream,
        r#type: EventType::from(wire.r#type.as_str()),
        timestamp: wire.timestamp,
        actor: Actor { kind, id: wire.actor_id },
        payload: wire.payload,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_well_formed_wire_event() {
        let wire = WireEvent {
            id: Identifier::new().to_string(),
            stream: "location:1".into(),
            r#type: "say".into(),
            timestamp: 42,
            actor_type: "character".into(),
            actor_id: "c1".into(),
            payload: b"hi".to_vec(),
        };
        let event = from_wire_event(wire).unwrap();
        assert_eq!(event.stream, "location:1");
        assert_eq!(event.r#type, EventType::Say);
        assert_eq!(event.actor.kind, ActorKind::Character);
    }

    #[test]
    fn rejects_malformed_event_id() {
        let wire = WireEvent {
            id: "not-an-id".into(),
            stream: "location:1".into(),
            r#type: "say".into(),
            timestamp: 0,
            actor_type: "character".into(),
            actor_id: "c1".into(),
            payload: Vec::new(),
        };
        assert!(from_wire_event(wire).is_err());
    }

    #[test]
    fn rejects_unknown_actor_type() {
        let wire = WireEvent {
            id: Identifier::new().to_string(),
            stream: "location:1".into(),
            r#type: "say".into(),
            timestamp: 0,
            actor_type: "robot".into(),
            actor_id: "c1".into(),
            payload: Vec::new(),
        };
        assert!(from_wire_event(wire).is_err());
    }
}
