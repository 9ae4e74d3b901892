//! Length-prefixed JSON framing (spec §4.I): a `u32` big-endian byte count
//! followed by that many bytes of UTF-8 JSON, one [`Frame`] per message.
//! Works over any `AsyncRead`/`AsyncWrite`, plaintext or TLS.

use holomush_protocol::{Frame, MAX_COMMAND_BYTES};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Read the next frame, or `Ok(None)` on a clean EOF between frames.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Frame>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(Error::message(format!("frame length read failed: {err}"))),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_COMMAND_BYTES {
        return Err(Error::message(format!("frame of {len} bytes exceeds the {MAX_COMMAND_BYTES} byte limit")));
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|err| Error::message(format!("frame body read failed: {err}")))?;

    let frame = serde_json::from_slice(&body).map_err(|err| Error::message(format!("malformed frame: {err}")))?;
    Ok(Some(frame))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let body = serde_json::to_vec(frame).map_err(|err| Error::message(format!("failed to encode frame: {err}")))?;
    let len = u32::try_from(body.len()).map_err(|_| Error::message("frame too large to encode"))?;

    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|err| Error::message(format!("frame write failed: {err}")))?;
    writer
        .write_all(&body)
        .await
        .map_err(|err| Error::message(format!("frame write failed: {err}")))?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use holomush_protocol::{AuthenticateRequest, RequestMeta};

    use super::*;

    #[tokio::test]
    async fn frame_round_trips_through_a_buffer() {
        let frame = Frame::Authenticate {
            meta: RequestMeta::new("req-1"),
            request: AuthenticateRequest {
                username: "alice".into(),
                password: "hunter2".into(),
            },
        };

        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let read_back = read_frame(&mut cursor).await.unwrap().unwrap();
        matches!(read_back, Frame::Authenticate { .. });
    }

    #[tokio::test]
    async fn empty_buffer_reads_as_clean_eof() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_COMMAND_BYTES as u32 + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_frame(&mut cursor).await.is_err());
    }
}
