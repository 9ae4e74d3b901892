//! Conversions between the domain [`holomush_common::Event`] and its wire
//! form, [`holomush_protocol::WireEvent`] (spec §6).

use holomush_common::{Actor, ActorKind, Event, EventType};
use holomush_protocol::WireEvent;

pub fn to_wire_event(event: &Event) -> WireEvent {
    let (actor_type, actor_id) = match event.actor.kind {
        ActorKind::Character => ("character", event.actor.id.clone()),
        ActorKind::System => ("system", event.actor.id.clone()),
        ActorKind::Plugin => ("plugin", event.actor.id.clone()),
    };
    WireEvent {
        id: event.id.to_string(),
        stream: event.stream.clone(),
        r#type: event.r#type.as_str().to_string(),
        timestamp: event.timestamp,
        actor_type: actor_type.to_string(),
        actor_id,
        payload: event.payload.clone(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_every_field_through() {
        let event = Event::new("location:1", EventType::Say, Actor::character("c1"), b"hi".to_vec());
        let wire = to_wire_event(&event);
        assert_eq!(wire.id, event.id.to_string());
        assert_eq!(wire.stream, "location:1");
        assert_eq!(wire.r#type, "say");
        assert_eq!(wire.actor_type, "character");
        assert_eq!(wire.actor_id, "c1");
        assert_eq!(wire.payload, b"hi");
    }
}
