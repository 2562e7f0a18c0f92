//! `Tread`/`Rread`: fetching a block by score.

use std::io::Write;

use byteorder::{WriteBytesExt, BE};

use super::Kind;
use crate::protocol::types::{Score, Type};
use crate::protocol::ProtocolError;

/// A trailer, appended after the score, whose length is fixed regardless of
/// score length: type (1 byte), a reserved pad byte, and the requested
/// count (4 bytes, big-endian).
const TRAILER_LEN: usize = 6;

/// A request to read the block identified by `score`.
///
/// Unlike most fields on the wire, `score` has no explicit length prefix:
/// its length is inferred from the packet's total length minus the fixed
/// trailer that follows it.
#[derive(Debug, Clone)]
pub struct Tread {
    /// Tag of this request.
    pub tag: u8,
    /// Score of the block to fetch.
    pub score: Score,
    /// Expected type of the block.
    pub kind: Type,
    /// Maximum number of bytes the caller is willing to accept in the reply.
    pub count: u32,
}

impl Tread {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Tread as u8)?;
        w.write_u8(self.tag)?;
        w.write_all(self.score.as_bytes())?;
        w.write_u8(self.kind.0)?;
        w.write_u8(0)?;
        w.write_u32::<BE>(self.count)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    ///
    /// The type byte is carried through unvalidated, per §4.3: an
    /// unrecognized type is still a well-formed `Tread`, not a decode
    /// error.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        if body.len() < 1 + TRAILER_LEN {
            return Err(ProtocolError::Invalid("Tread: short packet".into()));
        }
        let tag = body[0];
        let score_end = body.len() - TRAILER_LEN;
        let score = Score::from_bytes(body[1..score_end].to_vec());
        let kind = Type(body[score_end]);
        let count = u32::from_be_bytes(body[score_end + 2..score_end + 6].try_into().unwrap());
        Ok(Tread {
            tag,
            score,
            kind,
            count,
        })
    }
}

/// The reply to a [`Tread`]: the block's contents, or an empty body if the
/// server has nothing to return (a missing score is reported via
/// [`crate::protocol::message::Rerror`] instead, per §5 of the design
/// notes).
#[derive(Debug, Clone)]
pub struct Rread {
    /// Tag this reply answers.
    pub tag: u8,
    /// The block's contents.
    pub data: Vec<u8>,
}

impl Rread {
    /// Encodes this message, including its leading kind byte.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        w.write_u8(Kind::Rread as u8)?;
        w.write_u8(self.tag)?;
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Decodes a message body (everything after the kind byte).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *body.first().ok_or(ProtocolError::EmptyPacket)?;
        Ok(Rread {
            tag,
            data: body[1..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tread_roundtrip() {
        let t = Tread {
            tag: 1,
            score: Score::from_bytes(vec![0xaa; 20]),
            kind: Type::DATA,
            count: 8192,
        };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        let decoded = Tread::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 1);
        assert_eq!(decoded.score.as_bytes(), &[0xaa; 20][..]);
        assert_eq!(decoded.kind, Type::DATA);
        assert_eq!(decoded.count, 8192);
    }

    #[test]
    fn tread_decode_passes_through_unrecognized_type() {
        let t = Tread {
            tag: 1,
            score: Score::from_bytes(vec![0xaa; 20]),
            kind: Type(0x42),
            count: 1,
        };
        let mut buf = Vec::new();
        t.encode(&mut buf).unwrap();
        let decoded = Tread::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.kind, Type(0x42));
    }

    #[test]
    fn rread_roundtrip() {
        let r = Rread {
            tag: 5,
            data: vec![1, 2, 3, 4],
        };
        let mut buf = Vec::new();
        r.encode(&mut buf).unwrap();
        let decoded = Rread::decode(&buf[1..]).unwrap();
        assert_eq!(decoded.tag, 5);
        assert_eq!(decoded.data, vec![1, 2, 3, 4]);
    }
}
