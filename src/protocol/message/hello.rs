//! `Thello`/`Rhello`: the connection handshake.

use std::io::{Cursor, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use super::Kind;
use crate::protocol::pack::{read_short_bytes, read_string, write_short_bytes, write_string};
use crate::protocol::ProtocolError;

/// The client's half of the handshake.
///
/// Per the venti(7) manpage, `strong`, `crypto`, and `codec` exist to
/// negotiate authentication, encryption, and compression, but no
/// implementation honors them; they're carried across the wire and ignored.
#[derive(Debug, Clone)]
pub struct Thello {
    /// Tag of this request.
    pub tag: u8,
    /// The protocol version this client has chosen, e.g. `"04"`.
    pub version: String,
    /// The connecting user's claimed identity. Advisory only; there's no
    /// authentication to back it.
    pub uid: String,
    /// Requested auth/crypto/codec strength. Ignored by this core.
    pub strong: u8,
    /// Crypto negotiation argument. Ignored by this core.
    pub crypto: Vec<u8>,
    /// Codec negotiation argument. Ignored by this core.
    pub codec: Vec<u8>,
}

impl Thello {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Thello as u8)?;
        w.write_u8(self.tag)?;
        write_string(w, &self.version)?;
        write_string(w, &self.uid)?;
        w.write_u8(self.strong)?;
        write_short_bytes(w, &self.crypto)?;
        write_short_bytes(w, &self.codec)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut c = Cursor::new(body);
        let tag = c.read_u8()?;
        let (version, _) = read_string(&mut c)?;
        let (uid, _) = read_string(&mut c)?;
        let strong = c.read_u8()?;
        let (crypto, _) = read_short_bytes(&mut c)?;
        let (codec, _) = read_short_bytes(&mut c)?;
        Ok(Thello {
            tag,
            version,
            uid,
            strong,
            crypto,
            codec,
        })
    }
}

/// The server's half of the handshake, completing it.
#[derive(Debug, Clone)]
pub struct Rhello {
    /// Tag this reply answers (copied from the `Thello`).
    pub tag: u8,
    /// The server's claimed identity.
    pub sid: String,
    /// Chosen crypto mode. Always zero; no implementation negotiates this.
    pub crypto: u8,
    /// Chosen codec. Always zero; no implementation negotiates this.
    pub codec: u8,
}

impl Rhello {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rhello as u8)?;
        w.write_u8(self.tag)?;
        write_string(w, &self.sid)?;
        w.write_u8(self.crypto)?;
        w.write_u8(self.codec)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut c = Cursor::new(body);
        let tag = c.read_u8()?;
        let (sid, _) = read_string(&mut c)?;
        let crypto = c.read_u8()?;
        let codec = c.read_u8()?;
        Ok(Rhello {
            tag,
            sid,
            crypto,
            codec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thello_roundtrip() {
        let t = Thello {
            tag: 0x7,
            version: "04".into(),
            uid: "anonymous".into(),
            strong: 0,
            crypto: vec![],
            codec: vec![],
        };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        assert_eq!(buf[0], Kind::Thello as u8);

        let decoded = Thello::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 0x7);
        assert_eq!(decoded.version, "04");
        assert_eq!(decoded.uid, "anonymous");
    }

    #[test]
    fn rhello_roundtrip() {
        let r = Rhello {
            tag: 0x7,
            sid: "venti-rs".into(),
            crypto: 0,
            codec: 0,
        };
        let mut buf = Vec::new();
        r.encode(&mut buf).unwrap();
        let decoded = Rhello::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 0x7);
        assert_eq!(decoded.sid, "venti-rs");
    }
}
