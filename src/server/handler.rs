//! The handler contract a server-side application fulfills to back block
//! reads, writes, and syncs.

use std::io;

use crate::protocol::{Score, Type};

/// The error type returned by a [`Handler`]'s methods.
///
/// Deliberately loose: the server only needs the textual message to put in
/// an `Rerror` reply, so any boxed `std::error::Error` works.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A reader of block contents returned by [`Handler::read`].
///
/// If a handler's reader wraps a pooled buffer, it should override
/// [`done`](Self::done) to return that buffer to its pool; the server calls
/// it once the reply has been fully streamed to the client. The default
/// implementation does nothing.
pub trait BlockReader: io::Read + Send {
    /// Called after the server has finished streaming this reader's bytes
    /// into the reply packet.
    fn done(&mut self) {}
}

impl BlockReader for io::Cursor<Vec<u8>> {}

/// The interface a Venti server implementation provides.
///
/// Semantics documented here take precedence over the wire-level
/// description elsewhere: a handler is called once per request, from
/// whichever thread owns that connection, and must be safe to call
/// concurrently from the other threads owning other connections.
pub trait Handler: Send + Sync {
    /// Stores `data` as a block of type `kind` and returns its score.
    ///
    /// The returned score should be the hash of `data` under the
    /// negotiated scoring algorithm (SHA-1, for every peer this core
    /// speaks to).
    fn write(&self, kind: Type, data: &[u8]) -> Result<Score, HandlerError>;

    /// Returns a reader over up to `count` bytes of the block identified by
    /// `score`. A missing block is reported as an `Err`, not an empty
    /// reader.
    fn read(&self, score: &Score, kind: Type, count: u32) -> Result<Box<dyn BlockReader>, HandlerError>;

    /// Blocks until every write accepted before this call is durable.
    fn sync(&self) -> Result<(), HandlerError>;
}
