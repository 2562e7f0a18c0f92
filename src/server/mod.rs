//! The server half of the protocol: a connection-accepting loop plus the
//! per-connection state machine in [`connection`].
//!
//! A server is anything that can turn a [`Thello`] into a [`Handler`] —
//! everything else (version exchange, framing, dispatch) is handled here.
//! One thread is spawned per accepted connection; there is no connection
//! pool or executor to configure.

mod connection;
mod handler;

use std::net::{TcpListener, ToSocketAddrs};
use std::sync::Arc;

pub use handler::{BlockReader, Handler, HandlerError};

/// The client-side handshake request, as seen by a [`Handshake`] — the wire
/// tag is stripped, since it belongs to the request/reply plumbing, not to
/// the application.
#[derive(Debug, Clone)]
pub struct Thello {
    /// The connecting user's claimed identity. Advisory only.
    pub uid: String,
    /// Requested auth/crypto/codec strength. Ignored by this core.
    pub strength: u8,
    /// Crypto negotiation argument. Ignored by this core.
    pub crypto: Vec<u8>,
    /// Codec negotiation argument. Ignored by this core.
    pub codec: Vec<u8>,
}

/// The server's half of a completed handshake, as returned by a
/// [`Handshake`]. Returning `None` from the handshake accepts the
/// connection with the default reply (the client's own `uid` echoed back as
/// `sid`, no crypto or codec negotiated).
#[derive(Debug, Clone)]
pub struct Rhello {
    /// The server's claimed identity.
    pub sid: String,
    /// Chosen crypto mode. This core never negotiates one; always zero.
    pub crypto: u8,
    /// Chosen codec. This core never negotiates one; always zero.
    pub codec: u8,
}

/// Decides whether to accept an incoming connection and, if so, which
/// [`Handler`] will serve it.
///
/// Implemented for any matching closure; return `Err` to refuse the
/// connection outright (the caller gets an `Rerror` and the connection is
/// closed without a reply `Rhello`).
pub trait Handshake: Fn(&Thello) -> Result<(Option<Rhello>, Box<dyn Handler>), HandlerError> + Send + Sync {}

impl<F> Handshake for F where
    F: Fn(&Thello) -> Result<(Option<Rhello>, Box<dyn Handler>), HandlerError> + Send + Sync
{
}

/// Listens on `addr` and serves Venti connections until a listener-level
/// I/O error occurs. Each accepted connection runs on its own thread and
/// lives for exactly as long as that thread runs; a single misbehaving
/// client cannot block another.
pub fn serve(addr: impl ToSocketAddrs, handshake: impl Handshake + 'static) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    serve_on(listener, handshake)
}

/// Like [`serve`], but takes an already-bound listener (useful for tests
/// that need to discover an ephemeral port before clients connect).
pub fn serve_on(listener: TcpListener, handshake: impl Handshake + 'static) -> std::io::Result<()> {
    let handshake: Arc<dyn Handshake> = Arc::new(handshake);
    for stream in listener.incoming() {
        let stream = stream?;
        let handshake = handshake.clone();
        std::thread::spawn(move || connection::accept(stream, handshake));
    }
    Ok(())
}
