//! The RPC server core (components H and I, spec §4.H/§4.I): session
//! bookkeeping, command parsing, and the length-prefixed mutual-TLS RPC
//! surface clients talk to.

pub mod command;
pub mod error;
pub mod handler;
pub mod listener;
pub mod session_store;
pub mod transport;
mod wire;

pub use {
    error::{Error, Result},
    handler::RpcHandler,
    listener::serve,
    session_store::{SessionRecord, SessionStore},
};

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use holomush_broadcaster::Broadcaster;
    use holomush_common::RequestContext;
    use holomush_protocol::{
        AuthenticateRequest, DisconnectRequest, Frame, HandleCommandRequest, RequestMeta, SubscribeRequest,
    };
    use holomush_sessions::SessionManager;
    use holomush_store::{InMemoryEventStore, StaticCredentialVerifier};

    use super::*;

    const TABLE: &str = r#"
        [[user]]
        username = "alice"
        password = "hunter2"
        character_id = "01J0000000000000000000001"
        character_name = "Alice"
        location_id = "01J0000000000000000000002"
    "#;

    fn handler() -> RpcHandler {
        RpcHandler::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(StaticCredentialVerifier::from_toml(TABLE).unwrap()),
            Broadcaster::new(),
            SessionManager::new(),
        )
    }

    #[tokio::test]
    async fn authenticate_then_command_then_disconnect_round_trips() {
        let handler = handler();
        let ctx = RequestContext::new();

        let auth = handler
            .authenticate(
                &ctx,
                AuthenticateRequest {
                    username: "alice".into(),
                    password: "hunter2".into(),
                },
            )
            .await;
        assert!(auth.success);
        let session_id = auth.session_id.unwrap();

        let command = handler
            .handle_command(
                &ctx,
                HandleCommandRequest {
                    session_id: session_id.clone(),
                    command: "say hello".into(),
                },
            )
            .await;
        assert!(command.success);

        let disconnect = handler.disconnect(DisconnectRequest { session_id }).await;
        assert!(disconnect.success);
    }

    #[tokio::test]
    async fn command_against_unknown_session_is_rejected() {
        let handler = handler();
        let ctx = RequestContext::new();
        let response = handler
            .handle_command(
                &ctx,
                HandleCommandRequest {
                    session_id: "not-a-real-session".into(),
                    command: "say hi".into(),
                },
            )
            .await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let handler = handler();
        let ctx = RequestContext::new();
        let auth = handler
            .authenticate(
                &ctx,
                AuthenticateRequest {
                    username: "alice".into(),
                    password: "wrong".into(),
                },
            )
            .await;
        assert!(!auth.success);
    }

    // Alice's fixture location, shared by the subscribe tests below.
    const LOCATION_STREAM: &str = "location:01J0000000000000000000002";

    async fn authenticated_session(handler: &RpcHandler, ctx: &RequestContext) -> String {
        let auth = handler
            .authenticate(
                ctx,
                AuthenticateRequest {
                    username: "alice".into(),
                    password: "hunter2".into(),
                },
            )
            .await;
        assert!(auth.success);
        auth.session_id.unwrap()
    }

    #[tokio::test]
    async fn subscribe_delivers_live_events_to_an_existing_subscriber() {
        let handler = handler();
        let ctx = RequestContext::new();
        let session_id = authenticated_session(&handler, &ctx).await;

        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let sub_ctx = ctx.child();
        let subscribe_handler = handler.clone();
        let sub_session_id = session_id.clone();
        let subscribe_task = tokio::spawn(async move {
            subscribe_handler
                .subscribe(
                    &sub_ctx,
                    RequestMeta::new("req-1"),
                    SubscribeRequest {
                        session_id: sub_session_id,
                        streams: vec![LOCATION_STREAM.to_string()],
                    },
                    tx,
                )
                .await;
        });

        // Give the fan-in task a turn to register with the broadcaster
        // before the event is published.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handler
            .handle_command(
                &ctx,
                HandleCommandRequest {
                    session_id: session_id.clone(),
                    command: "say hello".into(),
                },
            )
            .await;

        match rx.recv().await.expect("a live event frame") {
            Frame::SubscribeEvent { event } => assert_eq!(event.stream, LOCATION_STREAM),
            other => panic!("expected a subscribe event frame, got {other:?}"),
        }

        ctx.cancel();
        subscribe_task.await.unwrap();
    }

    #[tokio::test]
    async fn subscribe_reports_cancellation_as_an_rpc_error() {
        let handler = handler();
        let ctx = RequestContext::new();
        let session_id = authenticated_session(&handler, &ctx).await;

        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let sub_ctx = ctx.child();
        let subscribe_handler = handler.clone();
        let subscribe_task = tokio::spawn(async move {
            subscribe_handler
                .subscribe(
                    &sub_ctx,
                    RequestMeta::new("req-1"),
                    SubscribeRequest {
                        session_id,
                        streams: vec![LOCATION_STREAM.to_string()],
                    },
                    tx,
                )
                .await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        ctx.cancel();

        match rx.recv().await.expect("a closing frame") {
            Frame::Error { error, .. } => assert_eq!(error.code, holomush_protocol::error_codes::CANCELLED),
            other => panic!("expected a cancellation error frame, got {other:?}"),
        }
        subscribe_task.await.unwrap();
    }

    #[tokio::test]
    async fn subscribe_against_an_unknown_session_reports_an_rpc_error() {
        let handler = handler();
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);

        handler
            .subscribe(
                &RequestContext::new(),
                RequestMeta::new("req-1"),
                SubscribeRequest {
                    session_id: "not-a-real-session".into(),
                    streams: vec![LOCATION_STREAM.to_string()],
                },
                tx,
            )
            .await;

        match rx.recv().await.expect("an error frame") {
            Frame::Error { error, .. } => assert_eq!(error.code, holomush_protocol::error_codes::SESSION_NOT_FOUND),
            other => panic!("expected a session-not-found error frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pose_alias_is_delivered_with_a_message_payload() {
        let handler = handler();
        let ctx = RequestContext::new();
        let session_id = authenticated_session(&handler, &ctx).await;

        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let sub_ctx = ctx.child();
        let subscribe_handler = handler.clone();
        let sub_session_id = session_id.clone();
        let subscribe_task = tokio::spawn(async move {
            subscribe_handler
                .subscribe(
                    &sub_ctx,
                    RequestMeta::new("req-1"),
                    SubscribeRequest {
                        session_id: sub_session_id,
                        streams: vec![LOCATION_STREAM.to_string()],
                    },
                    tx,
                )
                .await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handler
            .handle_command(
                &ctx,
                HandleCommandRequest {
                    session_id,
                    command: ":waves".into(),
                },
            )
            .await;

        match rx.recv().await.expect("a live event frame") {
            Frame::SubscribeEvent { event } => {
                assert_eq!(event.r#type, "pose");
                let payload: serde_json::Value = serde_json::from_slice(&event.payload).unwrap();
                assert_eq!(payload["message"], "waves");
            }
            other => panic!("expected a subscribe event frame, got {other:?}"),
        }

        ctx.cancel();
        subscribe_task.await.unwrap();
    }
}
