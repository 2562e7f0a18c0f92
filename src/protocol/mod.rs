//! The wire protocol: framing, the message codec, and the data model they
//! carry.
//!
//! Nothing in this module knows about sockets, threads, or tags — it is
//! pure encode/decode plus the byte-level primitives those codecs are built
//! from. [`crate::client`] and [`crate::server`] are the two places this
//! module's types meet an actual connection.

mod error;
pub mod frame;
pub mod message;
pub mod pack;
mod pool;
mod types;
pub mod version;

pub use error::ProtocolError;
pub use frame::{Chunker, Dechunker};
pub use pool::BufferPool;
pub use types::{Entry, Root, Score, Type, SCORE_SIZE};
