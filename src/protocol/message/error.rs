//! `Rerror`: the universal error reply, valid for any outstanding tag.

use std::io::{Cursor, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use super::Kind;
use crate::protocol::pack::{read_string, write_string};
use crate::protocol::ProtocolError;

/// An error reply. Any request may be answered with this instead of its
/// usual reply.
#[derive(Debug, Clone)]
pub struct Rerror {
    /// Tag this reply answers.
    pub tag: u8,
    /// Human-readable error text.
    pub text: String,
}

impl Rerror {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rerror as u8)?;
        w.write_u8(self.tag)?;
        write_string(w, &self.text)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut c = Cursor::new(body);
        let tag = c.read_u8()?;
        let (text, _) = read_string(&mut c)?;
        Ok(Rerror { tag, text })
    }
}

impl std::fmt::Display for Rerror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl std::error::Error for Rerror {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_roundtrip() {
        let e = Rerror {
            tag: 4,
            text: "no such block".into(),
        };
        let mut buf = Vec::new();
        e.encode(&mut buf).unwrap();
        let decoded = Rerror::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 4);
        assert_eq!(decoded.text, "no such block");
    }
}
