//! Length-prefixed JSON framing, the client side of the same wire format
//! `holomush_server::transport` implements (spec §4.I/§4.J): a `u32`
//! big-endian byte count followed by that many bytes of UTF-8 JSON.

use holomush_protocol::{Frame, MAX_COMMAND_BYTES};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Frame>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_COMMAND_BYTES {
        return Err(Error::message(format!("frame of {len} bytes exceeds the {MAX_COMMAND_BYTES} byte limit")));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    let frame = serde_json::from_slice(&body).map_err(|err| Error::message(format!("malformed frame: {err}")))?;
    Ok(Some(frame))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let body = serde_json::to_vec(frame).map_err(|err| Error::message(format!("failed to encode frame: {err}")))?;
    let len = u32::try_from(body.len()).map_err(|_| Error::message("frame too large to encode"))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    Ok(())
}
