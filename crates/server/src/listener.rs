//! The accept loop: one mutual-TLS (or, for tests, plaintext) TCP listener
//! fanning connections out to per-connection tasks (spec §4.I, §5).

use std::sync::Arc;

use holomush_common::RequestContext;
use holomush_protocol::Frame;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    sync::mpsc,
};
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use crate::{error::Result, handler::RpcHandler, transport};

/// Accept connections until `shutdown` is cancelled. `tls_config` of `None`
/// serves plaintext, used by tests and local development.
pub async fn serve(
    listener: TcpListener,
    tls_config: Option<Arc<rustls::ServerConfig>>,
    handler: RpcHandler,
    shutdown: RequestContext,
) -> std::io::Result<()> {
    let acceptor = tls_config.map(TlsAcceptor::from);
    info!(addr = ?listener.local_addr()?, tls = acceptor.is_some(), "accepting connections");

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let handler = handler.clone();
                let conn_ctx = shutdown.child();

                match &acceptor {
                    Some(acceptor) => {
                        let acceptor = acceptor.clone();
                        tokio::spawn(async move {
                            match acceptor.accept(stream).await {
                                Ok(tls_stream) => run_connection(tls_stream, handler, conn_ctx, peer).await,
                                Err(err) => warn!(%peer, %err, "TLS handshake failed"),
                            }
                        });
                    }
                    None => {
                        tokio::spawn(run_connection(stream, handler, conn_ctx, peer));
                    }
                }
            }
        }
    }
}

async fn run_connection<S>(stream: S, handler: RpcHandler, ctx: RequestContext, peer: std::net::SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    if let Err(err) = handle_connection(stream, handler, ctx).await {
        warn!(%peer, %err, "connection ended with an error");
    }
}

async fn handle_connection<S>(mut stream: S, handler: RpcHandler, ctx: RequestContext) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let Some(frame) = transport::read_frame(&mut stream).await? else {
            return Ok(());
        };

        match frame {
            Frame::Authenticate { meta, request } => {
                let response = handler.authenticate(&ctx, request).await;
                transport::write_frame(&mut stream, &Frame::AuthenticateResult { meta, response }).await?;
            }
            Frame::HandleCommand { meta, request } => {
                let response = handler.handle_command(&ctx, request).await;
                transport::write_frame(&mut stream, &Frame::HandleCommandResult { meta, response }).await?;
            }
            Frame::SubscribeOpen { meta, request } => {
                run_subscribe(&mut stream, &handler, &ctx, meta, request).await?;
                return Ok(());
            }
            Frame::Disconnect { meta, request } => {
                let response = handler.disconnect(request).await;
                transport::write_frame(&mut stream, &Frame::DisconnectResult { meta, response }).await?;
                return Ok(());
            }
            other => warn!(?other, "unexpected frame from client"),
        }
    }
}

/// `Subscribe` owns the connection for as long as it runs: the handler
/// streams events out over `stream` until the client drops the connection
/// or `ctx` is cancelled.
async fn run_subscribe<S>(
    stream: &mut S,
    handler: &RpcHandler,
    ctx: &RequestContext,
    meta: holomush_protocol::RequestMeta,
    request: holomush_protocol::SubscribeRequest,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel(holomush_protocol::MERGED_QUEUE_CAPACITY);
    let sub_ctx = ctx.child();
    let handler = handler.clone();
    let subscribe_task = tokio::spawn(async move { handler.subscribe(&sub_ctx, meta, request, tx).await });

    while let Some(frame) = rx.recv().await {
        let terminal = matches!(frame, Frame::SubscribeClosed | Frame::Error { .. });
        transport::write_frame(stream, &frame).await?;
        if terminal {
            break;
        }
    }

    let _ = subscribe_task.await;
    Ok(())
}
