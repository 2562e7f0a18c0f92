//! `Tping`/`Rping`: a no-op round trip used to check liveness.

use std::io::Write;

use byteorder::WriteBytesExt;

use super::Kind;
use crate::protocol::ProtocolError;

/// A ping request. Servers should answer it immediately.
#[derive(Debug, Copy, Clone)]
pub struct Tping {
    /// Tag of this request.
    pub tag: u8,
}

impl Tping {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Tping as u8)?;
        w.write_u8(self.tag)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Tping { tag })
    }
}

/// The reply to a [`Tping`].
#[derive(Debug, Copy, Clone)]
pub struct Rping {
    /// Tag this reply answers.
    pub tag: u8,
}

impl Rping {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rping as u8)?;
        w.write_u8(self.tag)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Rping { tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_roundtrip() {
        let t = Tping { tag: 3 };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![Kind::Tping as u8, 3]);
        assert_eq!(Tping::decode(&buf[1..]).unwrap().tag, 3);
    }
}
