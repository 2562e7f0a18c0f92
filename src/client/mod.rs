//! The client half of the protocol: a tagged-request multiplexer built atop
//! the frame and message codecs.
//!
//! A [`Client`] owns two halves of a connection — a [`Chunker`] for writes
//! and a [`Dechunker`] read by one background receiver thread — plus a
//! [`TagSet`] routing replies back to whichever caller thread is waiting on
//! them. Every public operation blocks the calling thread until its tagged
//! reply arrives or the connection dies.

mod tag_set;

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use thiserror::Error;

use crate::protocol::message::{
    kind_of, Kind, Rerror, Rhello, Rping, Rread, Rsync, Rwrite, Thello, Tgoodbye, Tping, Tread,
    Tsync, Twrite, GOODBYE_TAG,
};
use crate::protocol::{version, Chunker, Dechunker, ProtocolError, Score, Type};

pub use tag_set::TagSet;

/// The errors a [`Client`] operation can fail with.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A framing or codec error (I/O, version mismatch, malformed packet).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The server answered with an `Rerror` instead of the expected reply.
    #[error("server error: {0}")]
    Server(String),
    /// The server answered with a different message kind than the one this
    /// operation expected.
    #[error("wanted kind {want:?}, got kind {got:?}")]
    UnexpectedKind {
        /// The kind this operation required.
        want: Kind,
        /// The kind the server actually sent.
        got: Kind,
    },
    /// The connection is no longer usable, either because it was closed or
    /// because the receiver thread hit a fatal error. Once latched, every
    /// subsequent operation fails immediately without allocating a tag.
    #[error("connection closed: {0}")]
    Disconnected(String),
}

/// A byte stream that can be split into an independent read half and write
/// half sharing the same underlying connection, and torn down from either
/// half. Implemented for [`TcpStream`] and [`std::os::unix::net::UnixStream`];
/// anything else a caller wants to speak Venti over needs only these two
/// methods.
pub trait Transport: Read + Write + Send + 'static {
    /// Returns an independent handle to the same underlying connection.
    fn try_clone(&self) -> io::Result<Self>
    where
        Self: Sized;

    /// Shuts down both directions of the connection, unblocking any thread
    /// currently reading from a clone of it.
    fn shutdown(&self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn try_clone(&self) -> io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}

impl Transport for std::os::unix::net::UnixStream {
    fn try_clone(&self) -> io::Result<Self> {
        std::os::unix::net::UnixStream::try_clone(self)
    }

    fn shutdown(&self) -> io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, std::net::Shutdown::Both)
    }
}

/// State shared between a client's caller threads and its receiver thread.
struct Shared {
    /// The latched fatal error, if the receiver thread has hit one.
    err: Mutex<Option<String>>,
}

impl Shared {
    fn latch(&self, msg: String) {
        let mut err = self.err.lock().unwrap();
        if err.is_none() {
            *err = Some(msg);
        }
    }

    fn check(&self) -> Result<(), ClientError> {
        match &*self.err.lock().unwrap() {
            Some(msg) => Err(ClientError::Disconnected(msg.clone())),
            None => Ok(()),
        }
    }
}

/// A connection to a Venti server, from the client's point of view.
///
/// Cloning is not supported directly; wrap a `Client` in an [`Arc`] to share
/// it between threads (every operation already takes `&self`).
pub struct Client<T: Transport> {
    chunker: Arc<Chunker<T>>,
    dechunker: Arc<Dechunker<T>>,
    tags: Arc<TagSet>,
    shared: Arc<Shared>,
    transport_for_shutdown: T,
    receiver: Option<JoinHandle<()>>,

    /// The protocol version negotiated during connect, e.g. `"04"`.
    pub version: String,
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("version", &self.version).finish_non_exhaustive()
    }
}

/// Connects to a Venti server at `addr` over TCP.
pub fn dial(addr: impl std::net::ToSocketAddrs) -> Result<Client<TcpStream>, ClientError> {
    let stream = TcpStream::connect(addr).map_err(ProtocolError::from)?;
    Client::new(stream)
}

impl<T: Transport> Client<T> {
    /// Performs the version exchange and `Thello`/`Rhello` handshake over
    /// `transport`, then starts the receiver thread.
    pub fn new(mut transport: T) -> Result<Self, ClientError> {
        // The version line is raw, unframed text: it precedes any packet
        // framing, so it bypasses the chunker entirely.
        transport
            .write_all(version::line().as_bytes())
            .map_err(ProtocolError::from)?;
        transport.flush().map_err(ProtocolError::from)?;

        let read_half = transport.try_clone().map_err(ProtocolError::from)?;
        let dechunker = Arc::new(Dechunker::new(read_half));

        let peer_line = dechunker.read_line().map_err(ProtocolError::from)?;
        let negotiated = version::negotiate(&peer_line).ok_or(ProtocolError::VersionMismatch);
        let negotiated = match negotiated {
            Ok(v) => v,
            Err(e) => {
                let _ = transport.shutdown();
                return Err(e.into());
            }
        };

        let shutdown_handle = transport.try_clone().map_err(ProtocolError::from)?;
        let chunker = Arc::new(Chunker::new(transport));
        let tags = Arc::new(TagSet::new());
        let shared = Arc::new(Shared {
            err: Mutex::new(None),
        });

        let receiver = {
            let dechunker = dechunker.clone();
            let tags = tags.clone();
            let shared = shared.clone();
            std::thread::spawn(move || receive_loop(dechunker, tags, shared))
        };

        let mut client = Client {
            chunker,
            dechunker,
            tags,
            shared,
            transport_for_shutdown: shutdown_handle,
            receiver: Some(receiver),
            version: negotiated.to_string(),
        };

        if let Err(e) = client.handshake() {
            let _ = client.transport_for_shutdown.shutdown();
            return Err(e);
        }

        Ok(client)
    }

    fn handshake(&mut self) -> Result<(), ClientError> {
        let (tag, rx) = self.tags.allocate();
        let req = Thello {
            tag,
            version: self.version.clone(),
            uid: "anonymous".to_string(),
            strong: 0,
            crypto: Vec::new(),
            codec: Vec::new(),
        };
        self.send(tag, |w| req.encode(w))?;
        let body = self.await_reply(tag, rx)?;
        let _: Rhello = self.decode_expected(Kind::Rhello, body, Rhello::decode)?;
        Ok(())
    }

    /// Sends a no-op request and waits for the server to answer it,
    /// checking that the connection is alive end-to-end.
    pub fn ping(&self) -> Result<(), ClientError> {
        self.shared.check()?;
        let (tag, rx) = self.tags.allocate();
        let req = Tping { tag };
        self.send(tag, |w| req.encode(w))?;
        let body = self.await_reply(tag, rx)?;
        let _: Rping = self.decode_expected(Kind::Rping, body, Rping::decode)?;
        Ok(())
    }

    /// Blocks until the server has durably persisted every write accepted
    /// so far on this connection.
    pub fn sync(&self) -> Result<(), ClientError> {
        self.shared.check()?;
        let (tag, rx) = self.tags.allocate();
        let req = Tsync { tag };
        self.send(tag, |w| req.encode(w))?;
        let body = self.await_reply(tag, rx)?;
        let _: Rsync = self.decode_expected(Kind::Rsync, body, Rsync::decode)?;
        Ok(())
    }

    /// Writes `data` as a block of type `kind` and returns its score.
    pub fn write(&self, kind: Type, data: Vec<u8>) -> Result<Score, ClientError> {
        self.shared.check()?;
        let (tag, rx) = self.tags.allocate();
        let req = Twrite { tag, kind, data };
        self.send(tag, |w| req.encode(w))?;
        let body = self.await_reply(tag, rx)?;
        let reply: Rwrite = self.decode_expected(Kind::Rwrite, body, Rwrite::decode)?;
        Ok(reply.score)
    }

    /// Reads up to `count` bytes of the block identified by `score`.
    pub fn read(&self, kind: Type, score: &Score, count: u32) -> Result<Vec<u8>, ClientError> {
        self.shared.check()?;
        let (tag, rx) = self.tags.allocate();
        let req = Tread {
            tag,
            score: score.clone(),
            kind,
            count,
        };
        self.send(tag, |w| req.encode(w))?;
        let body = self.await_reply(tag, rx)?;
        let reply: Rread = self.decode_expected(Kind::Rread, body, Rread::decode)?;
        Ok(reply.data)
    }

    /// Gracefully closes the connection: sends `Tgoodbye`, stops the
    /// receiver thread, and closes the underlying transport.
    pub fn close(&mut self) -> Result<(), ClientError> {
        let req = Tgoodbye { tag: GOODBYE_TAG };
        let mut pb = self.chunker.begin_packet();
        let _ = req.encode(&mut pb);
        let _ = pb.finish();

        let _ = self.transport_for_shutdown.shutdown();
        self.tags.close_all();
        if let Some(h) = self.receiver.take() {
            let _ = h.join();
        }
        Ok(())
    }

    fn send(
        &self,
        tag: u8,
        encode: impl FnOnce(&mut crate::protocol::frame::PacketBuilder<'_, T>) -> Result<(), ProtocolError>,
    ) -> Result<(), ClientError> {
        let mut pb = self.chunker.begin_packet();
        if let Err(e) = encode(&mut pb) {
            self.tags.cancel(tag);
            return Err(e.into());
        }
        if let Err(e) = pb.finish() {
            self.tags.cancel(tag);
            return Err(ProtocolError::from(e).into());
        }
        Ok(())
    }

    fn await_reply(
        &self,
        tag: u8,
        rx: futures::channel::oneshot::Receiver<Vec<u8>>,
    ) -> Result<Vec<u8>, ClientError> {
        match futures::executor::block_on(rx) {
            Ok(buf) => Ok(buf),
            Err(_canceled) => {
                log::debug!("venti: tag {tag:#x} cancelled, connection torn down");
                self.shared.check()?;
                Err(ClientError::Disconnected(
                    "connection closed while awaiting reply".to_string(),
                ))
            }
        }
    }

    fn decode_expected<R>(
        &self,
        want: Kind,
        body: Vec<u8>,
        decode: impl FnOnce(&[u8]) -> Result<R, ProtocolError>,
    ) -> Result<R, ClientError> {
        let result = (|| -> Result<R, ClientError> {
            let kind = kind_of(&body)?;
            if kind == Kind::Rerror {
                let e = Rerror::decode(&body[1..])?;
                return Err(ClientError::Server(e.text));
            }
            if kind != want {
                return Err(ClientError::UnexpectedKind { want, got: kind });
            }
            Ok(decode(&body[1..])?)
        })();
        self.dechunker.release(body);
        result
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// The receiver thread body: reads packets until an I/O error, delivering
/// each to its tag's waiter.
fn receive_loop<T: Transport>(dechunker: Arc<Dechunker<T>>, tags: Arc<TagSet>, shared: Arc<Shared>) {
    loop {
        match dechunker.read_packet() {
            Ok(buf) => {
                if buf.len() < 2 {
                    log::error!("venti: packet too short to carry a tag");
                    continue;
                }
                let tag = buf[1];
                log::trace!("venti: delivering reply for tag {tag:#x}");
                tags.deliver(tag, buf);
            }
            Err(e) => {
                log::error!("venti: receiver thread latching fatal error: {e}");
                shared.latch(e.to_string());
                tags.close_all();
                return;
            }
        }
    }
}
