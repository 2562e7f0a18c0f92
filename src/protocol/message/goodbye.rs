//! `Tgoodbye`: an unacknowledged notice that the client is disconnecting.

use std::io::Write;

use byteorder::WriteBytesExt;

use super::Kind;
use crate::protocol::ProtocolError;

/// The client's notice that it is closing the connection. There is no reply;
/// the server tears the connection down on receipt.
///
/// The tag is meaningless since no reply is ever sent; this core always
/// sends the fixed sentinel tag `0x42`.
#[derive(Debug, Copy, Clone)]
pub struct Tgoodbye {
    /// Tag of this request. Unused by the protocol.
    pub tag: u8,
}

/// The fixed tag used for every [`Tgoodbye`] this core sends.
pub const GOODBYE_TAG: u8 = 0x42;

impl Tgoodbye {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Tgoodbye as u8)?;
        w.write_u8(self.tag)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Tgoodbye { tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goodbye_roundtrip() {
        let t = Tgoodbye { tag: GOODBYE_TAG };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        assert_eq!(Tgoodbye::decode(&buf[1..]).unwrap().tag, GOODBYE_TAG);
    }
}
