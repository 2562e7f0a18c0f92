//! `Tsync`/`Rsync`: requests that prior writes be made durable.

use std::io::Write;

use byteorder::WriteBytesExt;

use super::Kind;
use crate::protocol::ProtocolError;

/// A request that all writes accepted so far be flushed to stable storage
/// before the reply is sent.
#[derive(Debug, Copy, Clone)]
pub struct Tsync {
    /// Tag of this request.
    pub tag: u8,
}

impl Tsync {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Tsync as u8)?;
        w.write_u8(self.tag)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Tsync { tag })
    }
}

/// The reply to a [`Tsync`], sent once prior writes are durable.
#[derive(Debug, Copy, Clone)]
pub struct Rsync {
    /// Tag this reply answers.
    pub tag: u8,
}

impl Rsync {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rsync as u8)?;
        w.write_u8(self.tag)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Rsync { tag })
    }
}
