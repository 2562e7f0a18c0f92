//! The message codec: one module per request/reply pair, plus the [`Kind`]
//! tag that prefixes every packet on the wire.

mod error;
mod goodbye;
mod hello;
mod ping;
mod read;
mod sync;
mod write;

pub use error::Rerror;
pub use goodbye::{Tgoodbye, GOODBYE_TAG};
pub use hello::{Rhello, Thello};
pub use ping::{Rping, Tping};
pub use read::{Rread, Tread};
pub use sync::{Rsync, Tsync};
pub use write::{Rwrite, Twrite};

use enum_primitive_derive::Primitive;

/// The first byte of every packet body, identifying which message follows.
///
/// Values 7 through 11 are reserved by the wire format for a goodbye
/// acknowledgement and a two-round auth exchange; no implementation of this
/// core speaks them, so decoding one is reported via
/// [`super::ProtocolError::Unimplemented`] rather than silently ignored.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Primitive)]
pub enum Kind {
    /// An error reply, valid in response to any request.
    Rerror = 1,
    /// A ping request.
    Tping = 2,
    /// A ping reply.
    Rping = 3,
    /// The client's half of the handshake.
    Thello = 4,
    /// The server's half of the handshake.
    Rhello = 5,
    /// A graceful disconnect notice; no reply is sent.
    Tgoodbye = 6,
    /// Reserved: acknowledgement of a goodbye. Never sent by this core.
    Rgoodbye = 7,
    /// Reserved: first round of an authentication exchange.
    Tauth0 = 8,
    /// Reserved: first round of an authentication exchange.
    Rauth0 = 9,
    /// Reserved: second round of an authentication exchange.
    Tauth1 = 10,
    /// Reserved: second round of an authentication exchange.
    Rauth1 = 11,
    /// A block read request.
    Tread = 12,
    /// A block read reply.
    Rread = 13,
    /// A block write request.
    Twrite = 14,
    /// A block write reply.
    Rwrite = 15,
    /// A sync request.
    Tsync = 16,
    /// A sync reply.
    Rsync = 17,
}

impl Kind {
    /// True if this core implements the given kind. The auth and goodbye-ack
    /// kinds are reserved on the wire but never produced or consumed here.
    pub fn is_implemented(self) -> bool {
        !matches!(
            self,
            Kind::Rgoodbye | Kind::Tauth0 | Kind::Rauth0 | Kind::Tauth1 | Kind::Rauth1
        )
    }
}

/// Reads the kind byte off the front of a packet body.
pub fn kind_of(body: &[u8]) -> Result<Kind, super::ProtocolError> {
    use num_traits::FromPrimitive as _;
    let raw = *body
        .first()
        .ok_or_else(|| super::ProtocolError::Invalid("empty packet body".to_string()))?;
    Kind::from_u8(raw)
        .ok_or_else(|| super::ProtocolError::Invalid(format!("unknown message kind {raw:#x}")))
}

/// Reads the tag byte (the second byte) off a packet body.
pub fn tag_of(body: &[u8]) -> Result<u8, super::ProtocolError> {
    body.get(1)
        .copied()
        .ok_or_else(|| super::ProtocolError::Invalid("packet too short to carry a tag".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive as _;

    #[test]
    fn reserved_kinds_are_unimplemented() {
        for raw in 7u8..=11 {
            let k = Kind::from_u8(raw).unwrap();
            assert!(!k.is_implemented());
        }
    }

    #[test]
    fn core_kinds_are_implemented() {
        for raw in [1u8, 2, 3, 4, 5, 6, 12, 13, 14, 15, 16, 17] {
            let k = Kind::from_u8(raw).unwrap();
            assert!(k.is_implemented());
        }
    }
}
