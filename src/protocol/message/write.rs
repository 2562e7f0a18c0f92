//! `Twrite`/`Rwrite`: submitting a block's contents.

use std::io::Write as _;

use byteorder::WriteBytesExt;

use super::Kind;
use crate::protocol::types::{Score, Type};
use crate::protocol::ProtocolError;

/// A request to store `data` as a block of type `kind`.
///
/// The header (tag, type, and three reserved pad bytes) is a fixed five
/// bytes; everything after it is the block's contents.
#[derive(Debug, Clone)]
pub struct Twrite {
    /// Tag of this request.
    pub tag: u8,
    /// Type of the block being written.
    pub kind: Type,
    /// The block's contents.
    pub data: Vec<u8>,
}

impl Twrite {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: std::io::Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Twrite as u8)?;
        w.write_u8(self.tag)?;
        w.write_u8(self.kind.0)?;
        w.write_all(&[0u8; 3])?;
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    ///
    /// The type byte is carried through unvalidated: per §4.3, decoders
    /// check only buffer sufficiency, not semantic plausibility, so a type
    /// this core doesn't recognize is still a well-formed `Twrite`.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        if body.len() < 5 {
            return Err(ProtocolError::Invalid("Twrite: short packet".into()));
        }
        let tag = body[0];
        let kind = Type(body[1]);
        Ok(Twrite {
            tag,
            kind,
            data: body[5..].to_vec(),
        })
    }
}

/// The reply to a [`Twrite`]: the score the server computed for the stored
/// block.
#[derive(Debug, Clone)]
pub struct Rwrite {
    /// Tag this reply answers.
    pub tag: u8,
    /// Score of the stored block.
    pub score: Score,
}

impl Rwrite {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: std::io::Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rwrite as u8)?;
        w.write_u8(self.tag)?;
        w.write_all(self.score.as_bytes())?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Rwrite {
            tag,
            score: Score::from_bytes(body[1..].to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twrite_roundtrip() {
        let t = Twrite {
            tag: 2,
            kind: Type::DATA,
            data: vec![9, 9, 9],
        };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        let decoded = Twrite::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 2);
        assert_eq!(decoded.kind, Type::DATA);
        assert_eq!(decoded.data, vec![9, 9, 9]);
    }

    #[test]
    fn twrite_decode_passes_through_unrecognized_type() {
        let t = Twrite {
            tag: 2,
            kind: Type(0xee),
            data: vec![1],
        };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        let decoded = Twrite::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.kind, Type(0xee));
    }

    #[test]
    fn rwrite_roundtrip() {
        let r = Rwrite {
            tag: 6,
            score: Score::from_bytes(vec![0x11; 20]),
        };
        let mut buf = Vec::new();
        r.encode(&mut buf).unwrap();
        let decoded = Rwrite::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 6);
        assert_eq!(decoded.score.as_bytes(), &[0x11; 20][..]);
    }
}
