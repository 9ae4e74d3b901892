//! The RPC client (component J, spec §4.J): a long-lived, mutual-TLS (or
//! plaintext, for local tooling) connection to a `holomush-server` core.

pub mod error;
mod transport;
mod wire;

use std::{
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
    time::Duration,
};

use futures::Stream;
use holomush_common::Event;
use holomush_protocol::{
    AuthenticateRequest, AuthenticateResponse, DisconnectRequest, DisconnectResponse, Frame, HandleCommandRequest,
    HandleCommandResponse, RequestMeta, SubscribeRequest,
};
use rustls::pki_types::ServerName;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    net::TcpStream,
};
use tokio_rustls::TlsConnector;

pub use error::{Error, Result};
use wire::from_wire_event;

/// spec §4.J defaults for the OS-level TCP keepalive probe.
pub const KEEPALIVE_INTERVAL_SECS: u64 = holomush_protocol::KEEPALIVE_INTERVAL_SECS;
pub const KEEPALIVE_TIMEOUT_SECS: u64 = holomush_protocol::KEEPALIVE_TIMEOUT_SECS;

enum Transport {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for Transport {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

fn tune(stream: &TcpStream) -> Result<()> {
    stream.set_nodelay(true)?;
    let socket = socket2::SockRef::from(stream);
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(Duration::from_secs(KEEPALIVE_INTERVAL_SECS))
        .with_interval(Duration::from_secs(KEEPALIVE_TIMEOUT_SECS));
    socket.set_tcp_keepalive(&keepalive)?;
    Ok(())
}

/// A connection to one `holomush-server` core. Not `Clone` — the wire
/// protocol is one in-flight call per connection (spec §6), so callers
/// needing concurrency open more than one `RpcClient`.
pub struct RpcClient {
    transport: Transport,
    next_request_id: AtomicU64,
}

impl RpcClient {
    /// Connect in plaintext. Intended for local development and tests —
    /// production deployments use [`Self::connect_tls`].
    pub async fn connect(addr: &str) -> Result<Self> {
        if addr.trim().is_empty() {
            return Err(Error::EmptyAddress);
        }
        let stream = TcpStream::connect(addr).await?;
        tune(&stream)?;
        Ok(Self {
            transport: Transport::Plain(stream),
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Connect over mutual TLS.
    pub async fn connect_tls(addr: &str, tls_config: rustls::ClientConfig, server_name: ServerName<'static>) -> Result<Self> {
        if addr.trim().is_empty() {
            return Err(Error::EmptyAddress);
        }
        let stream = TcpStream::connect(addr).await?;
        tune(&stream)?;
        let connector = TlsConnector::from(std::sync::Arc::new(tls_config));
        let tls_stream = connector.connect(server_name, stream).await?;
        Ok(Self {
            transport: Transport::Tls(Box::new(tls_stream)),
            next_request_id: AtomicU64::new(1),
        })
    }

    fn next_meta(&self) -> RequestMeta {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        RequestMeta::new(format!("req-{id}"))
    }

    async fn call<F>(&mut self, request: Frame, extract: F) -> Result<Frame>
    where
        F: Fn(&Frame) -> bool,
    {
        transport::write_frame(&mut self.transport, &request).await?;
        match transport::read_frame(&mut self.transport).await? {
            Some(frame) if extract(&frame) => Ok(frame),
            Some(Frame::Error { error, .. }) => Err(Error::Rpc(error)),
            Some(_other) => Err(Error::message("unexpected response frame")),
            None => Err(Error::message("connection closed before a response arrived")),
        }
    }

    pub async fn authenticate(&mut self, username: impl Into<String>, password: impl Into<String>) -> Result<AuthenticateResponse> {
        let meta = self.next_meta();
        let request = Frame::Authenticate {
            meta,
            request: AuthenticateRequest {
                username: username.into(),
                password: password.into(),
            },
        };
        let frame = self.call(request, |f| matches!(f, Frame::AuthenticateResult { .. })).await?;
        match frame {
            Frame::AuthenticateResult { response, .. } => Ok(response),
            _ => unreachable!("call() guaranteed a matching frame"),
        }
    }

    pub async fn handle_command(&mut self, session_id: impl Into<String>, command: impl Into<String>) -> Result<HandleCommandResponse> {
        let meta = self.next_meta();
        let request = Frame::HandleCommand {
            meta,
            request: HandleCommandRequest {
                session_id: session_id.into(),
                command: command.into(),
            },
        };
        let frame = self.call(request, |f| matches!(f, Frame::HandleCommandResult { .. })).await?;
        match frame {
            Frame::HandleCommandResult { response, .. } => Ok(response),
            _ => unreachable!("call() guaranteed a matching frame"),
        }
    }

    pub async fn disconnect(mut self, session_id: impl Into<String>) -> Result<DisconnectResponse> {
        let meta = self.next_meta();
        let request = Frame::Disconnect {
            meta,
            request: DisconnectRequest { session_id: session_id.into() },
        };
        let frame = self.call(request, |f| matches!(f, Frame::DisconnectResult { .. })).await?;
        match frame {
            Frame::DisconnectResult { response, .. } => Ok(response),
            _ => unreachable!("call() guaranteed a matching frame"),
        }
    }

    /// Open the one streaming method. Consumes the connection: per spec §6
    /// one connection carries one in-flight unary call or one in-flight
    /// `Subscribe`, never both at once.
    pub fn subscribe(mut self, session_id: impl Into<String>, streams: Vec<String>) -> impl Stream<Item = Result<Event>> {
        let session_id = session_id.into();
        async_stream::stream! {
            let meta = self.next_meta();
            let open = Frame::SubscribeOpen {
                meta,
                request: SubscribeRequest { session_id, streams },
            };
            if let Err(err) = transport::write_frame(&mut self.transport, &open).await {
                yield Err(err);
                return;
            }

            loop {
                match transport::read_frame(&mut self.transport).await {
                    Ok(Some(Frame::SubscribeEvent { event })) => yield from_wire_event(event),
                    Ok(Some(Frame::SubscribeClosed)) => break,
                    Ok(Some(Frame::Error { error, .. })) => {
                        yield Err(Error::Rpc(error));
                        break;
                    }
                    Ok(Some(_other)) => {
                        yield Err(Error::message("unexpected frame during subscribe"));
                        break;
                    }
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        }
    }
}
