//! The four RPC methods (component I, spec §4.I): `Authenticate`,
//! `HandleCommand`, `Subscribe`, `Disconnect`.

use std::sync::Arc;

use holomush_broadcaster::Broadcaster;
use holomush_common::{Actor, Identifier, RequestContext};
use holomush_protocol::{
    AuthenticateRequest, AuthenticateResponse, DisconnectRequest, DisconnectResponse, ErrorShape, Frame,
    HandleCommandRequest, HandleCommandResponse, RequestMeta, SubscribeRequest,
};
use holomush_sessions::SessionManager;
use holomush_store::{CredentialVerifier, EventStore};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    command::parse_command,
    error::{Error, Result},
    session_store::{SessionRecord, SessionStore},
    wire::to_wire_event,
};

/// Backlog replayed to a fresh subscription before it starts receiving
/// live events.
const REPLAY_BACKLOG_LIMIT: usize = 10_000;

fn location_stream(location_id: Identifier) -> String {
    format!("location:{location_id}")
}

/// Wrap a domain error as the transport-level `Frame::Error` it maps to
/// (spec §7, axis 1). Only meant for errors whose `transport_code` is
/// `Some` — `Subscribe`'s three RPC-error paths all qualify.
fn error_frame(meta: RequestMeta, err: &Error) -> Frame {
    let code = err.transport_code().unwrap_or(holomush_protocol::error_codes::INVALID_REQUEST);
    Frame::Error {
        meta,
        error: ErrorShape::new(code, err.to_string()),
    }
}

/// Why the live-event loop in `subscribe` stopped.
enum EndReason {
    Cancelled,
    SendFailed { event_id: String, cause: String },
    Done,
}

/// Everything the four RPC methods need. One instance is shared across
/// every connection a server accepts.
#[derive(Clone)]
pub struct RpcHandler {
    event_store: Arc<dyn EventStore>,
    credential_verifier: Arc<dyn CredentialVerifier>,
    broadcaster: Broadcaster,
    session_manager: SessionManager,
    session_store: SessionStore,
}

impl RpcHandler {
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        credential_verifier: Arc<dyn CredentialVerifier>,
        broadcaster: Broadcaster,
        session_manager: SessionManager,
    ) -> Self {
        Self {
            event_store,
            credential_verifier,
            broadcaster,
            session_manager,
            session_store: SessionStore::new(),
        }
    }

    pub async fn authenticate(&self, ctx: &RequestContext, request: AuthenticateRequest) -> AuthenticateResponse {
        let identity = match self
            .credential_verifier
            .authenticate(ctx, &request.username, &request.password)
            .await
        {
            Ok(identity) => identity,
            Err(holomush_store::Error::Unconfigured) => {
                return AuthenticateResponse::failure(Error::AuthUnconfigured.to_string());
            }
            Err(err) => {
                return AuthenticateResponse::failure(Error::AuthRejected(err.to_string()).to_string());
            }
        };

        let session_id = Identifier::new();
        let connection_id = Identifier::new();
        self.session_store
            .insert(
                session_id,
                SessionRecord {
                    character_id: identity.character_id,
                    connection_id,
                    location_id: identity.location_id,
                },
            )
            .await;
        self.session_manager.connect(identity.character_id, connection_id).await;

        info!(character = %identity.character_id, session = %session_id, "character authenticated");
        AuthenticateResponse {
            success: true,
            session_id: Some(session_id.to_string()),
            character_id: Some(identity.character_id.to_string()),
            character_name: Some(identity.character_name),
            error: None,
        }
    }

    pub async fn handle_command(&self, ctx: &RequestContext, request: HandleCommandRequest) -> HandleCommandResponse {
        match self.try_handle_command(ctx, &request).await {
            Ok(output) => HandleCommandResponse::ok(output),
            Err(err) => HandleCommandResponse::failure(err.to_string()),
        }
    }

    async fn try_handle_command(&self, ctx: &RequestContext, request: &HandleCommandRequest) -> Result<String> {
        let session_id: Identifier = request
            .session_id
            .parse()
            .map_err(|_| Error::SessionNotFound)?;
        let record = self.session_store.get(session_id).await.ok_or(Error::SessionNotFound)?;

        let (verb, argument) = parse_command(&request.command)?;
        if !holomush_engine::KNOWN_VERBS.contains(&verb.as_str()) {
            return Err(Error::UnknownCommand(verb));
        }

        let stream = location_stream(record.location_id);
        let actor = Actor::character(record.character_id.to_string());
        let event = holomush_engine::dispatch(&verb, actor, stream, &argument)
            .map_err(|cause| Error::command_failed(verb.clone(), cause))?;

        self.event_store.append(ctx, event.clone()).await?;
        self.broadcaster.broadcast(event).await;
        Ok(format!("{verb} ok"))
    }

    /// Run a subscription to completion: replay each stream's backlog,
    /// then forward live events as `SubscribeEvent` frames over `out`
    /// until the client disconnects or `ctx` is cancelled.
    ///
    /// Every path out sends exactly one final frame: `Frame::Error` for an
    /// unresolvable session, a failed send, or cancellation, and
    /// `Frame::SubscribeClosed` when the stream simply ran out. By the time
    /// that frame is sent, every per-stream fan-in task has already
    /// unsubscribed from the broadcaster.
    pub async fn subscribe(
        &self,
        ctx: &RequestContext,
        meta: RequestMeta,
        request: SubscribeRequest,
        out: mpsc::Sender<Frame>,
    ) {
        let Ok(session_id) = request.session_id.parse::<Identifier>() else {
            let _ = out.send(error_frame(meta, &Error::SessionNotFound)).await;
            return;
        };
        let Some(record) = self.session_store.get(session_id).await else {
            let _ = out.send(error_frame(meta, &Error::SessionNotFound)).await;
            return;
        };

        let (merge_tx, mut merge_rx) = mpsc::channel(holomush_protocol::MERGED_QUEUE_CAPACITY);
        let mut fan_in_tasks = Vec::with_capacity(request.streams.len());
        let fan_in_stop = ctx.child();

        for stream in request.streams {
            let after = self
                .session_manager
                .cursor(record.character_id, &stream)
                .await
                .unwrap_or(Identifier::NIL);
            match self.event_store.replay(ctx, &stream, after, REPLAY_BACKLOG_LIMIT).await {
                Ok(backlog) => {
                    for event in backlog {
                        if merge_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Err(err) => warn!(%stream, error = %err, "replay failed, continuing with live events only"),
            }

            let mut subscription = self.broadcaster.subscribe(stream).await;
            let broadcaster = self.broadcaster.clone();
            let merge_tx = merge_tx.clone();
            let child = fan_in_stop.child();
            fan_in_tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = child.cancelled() => break,
                        event = subscription.recv() => match event {
                            Some(event) => {
                                if merge_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
                broadcaster.unsubscribe(&subscription).await;
            }));
        }
        drop(merge_tx);

        let end = 'main: loop {
            tokio::select! {
                () = ctx.cancelled() => break 'main EndReason::Cancelled,
                event = merge_rx.recv() => match event {
                    Some(event) => {
                        self.session_manager.set_cursor(record.character_id, event.stream.clone(), event.id).await;
                        let event_id = event.id.to_string();
                        let frame = Frame::SubscribeEvent { event: to_wire_event(&event) };
                        if out.send(frame).await.is_err() {
                            break 'main EndReason::SendFailed { event_id, cause: "receiver dropped".to_string() };
                        }
                    }
                    None => break 'main EndReason::Done,
                },
            }
        };

        fan_in_stop.cancel();
        for task in fan_in_tasks {
            let _ = task.await;
        }

        let frame = match end {
            EndReason::Cancelled => error_frame(meta, &Error::SubscriptionCancelled),
            EndReason::SendFailed { event_id, cause } => error_frame(meta, &Error::send_failed(event_id, cause)),
            EndReason::Done => Frame::SubscribeClosed,
        };
        let _ = out.send(frame).await;
    }

    pub async fn disconnect(&self, request: DisconnectRequest) -> DisconnectResponse {
        let Ok(session_id) = request.session_id.parse::<Identifier>() else {
            return DisconnectResponse { success: false };
        };
        match self.session_store.remove(session_id).await {
            Some(record) => {
                self.session_manager.disconnect(record.character_id, record.connection_id).await;
                DisconnectResponse { success: true }
            }
            None => DisconnectResponse { success: false },
        }
    }
}
