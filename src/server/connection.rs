//! The per-connection state machine: version exchange, handshake, and the
//! request-dispatch loop.

use std::io::Write as _;
use std::sync::Arc;

use crate::client::Transport;
use crate::protocol::message::{self, kind_of, Kind};
use crate::protocol::{frame::PacketBuilder, version, Chunker, Dechunker, ProtocolError};

use super::handler::Handler;
use super::{Handshake, Rhello, Thello};

/// Drives one accepted connection to completion, logging (rather than
/// propagating) whatever error ends it — the accept loop has nowhere to
/// send a per-connection error.
pub(crate) fn accept<T: Transport>(transport: T, handshake: Arc<dyn Handshake>) {
    match run(transport, handshake) {
        Ok(()) => log::debug!("venti: connection closed"),
        Err(e) => log::error!("venti: connection error: {e}"),
    }
}

fn run<T: Transport>(mut transport: T, handshake: Arc<dyn Handshake>) -> Result<(), ProtocolError> {
    // Server side reads the client's version line first, then replies with
    // its own, per the NEW -> VERSIONED transition.
    let read_half = transport.try_clone()?;
    let dechunker = Dechunker::new(read_half);
    let client_line = dechunker.read_line()?;

    transport.write_all(version::line().as_bytes())?;
    transport.flush()?;

    if version::negotiate(&client_line).is_none() {
        return Err(ProtocolError::VersionMismatch);
    }

    let chunker = Chunker::new(transport);

    let (tag, handler) = match do_handshake(&dechunker, &chunker, handshake.as_ref()) {
        Ok(v) => v,
        Err(e) => return Err(e),
    };
    let _ = tag;

    loop {
        let body = dechunker.read_packet()?;
        match dispatch(&body, handler.as_ref(), &chunker) {
            Ok(Outcome::Continue) => {
                dechunker.release(body);
            }
            Ok(Outcome::Goodbye) => {
                dechunker.release(body);
                return Ok(());
            }
            Err(e) => {
                dechunker.release(body);
                return Err(e);
            }
        }
    }
}

/// VERSIONED -> OPEN: read the client's `Thello`, invoke the user-supplied
/// handshake function, and send `Rhello`.
fn do_handshake<T: std::io::Write>(
    dechunker: &Dechunker<impl std::io::Read>,
    chunker: &Chunker<T>,
    handshake: &dyn Handshake,
) -> Result<(u8, Box<dyn Handler>), ProtocolError> {
    let body = dechunker.read_packet()?;
    let result = (|| -> Result<(u8, Box<dyn Handler>), ProtocolError> {
        let kind = kind_of(&body)?;
        if kind != Kind::Thello {
            return Err(ProtocolError::Invalid(format!(
                "expected Thello, got kind {kind:?}"
            )));
        }
        let wire = message::Thello::decode(&body[1..])?;
        let tag = wire.tag;

        let request = Thello {
            uid: wire.uid,
            strength: wire.strong,
            crypto: wire.crypto,
            codec: wire.codec,
        };

        let (rhello, handler) = handshake(&request).map_err(|e| {
            ProtocolError::Invalid(format!("handshake rejected: {e}"))
        })?;
        let rhello = rhello.unwrap_or(Rhello {
            sid: request.uid.clone(),
            crypto: 0,
            codec: 0,
        });

        let reply = message::Rhello {
            tag,
            sid: rhello.sid,
            crypto: rhello.crypto,
            codec: rhello.codec,
        };
        write_packet(chunker, |w| reply.encode(w))?;

        Ok((tag, handler))
    })();

    dechunker.release(body);
    result
}

enum Outcome {
    Continue,
    Goodbye,
}

/// OPEN: handle exactly one incoming T-message, replying (or tearing down)
/// per §4.7's dispatch table.
fn dispatch<T: std::io::Write>(
    body: &[u8],
    handler: &dyn Handler,
    chunker: &Chunker<T>,
) -> Result<Outcome, ProtocolError> {
    let kind = kind_of(body)?;
    let tag = message::tag_of(body)?;

    match kind {
        Kind::Thello => {
            send_error(chunker, tag, "unexpected hello")?;
            Err(ProtocolError::Invalid(
                "Thello received inside an established connection".to_string(),
            ))
        }
        Kind::Twrite => {
            let req = match message::Twrite::decode(&body[1..]) {
                Ok(req) => req,
                Err(e) => {
                    send_error(chunker, tag, &e.to_string())?;
                    return Err(e);
                }
            };
            match handler.write(req.kind, &req.data) {
                Ok(score) => {
                    let reply = message::Rwrite { tag, score };
                    write_packet(chunker, |w| reply.encode(w))?;
                }
                Err(e) => send_error(chunker, tag, &e.to_string())?,
            }
            Ok(Outcome::Continue)
        }
        Kind::Tread => {
            let req = match message::Tread::decode(&body[1..]) {
                Ok(req) => req,
                Err(e) => {
                    send_error(chunker, tag, &e.to_string())?;
                    return Err(e);
                }
            };
            match handler.read(&req.score, req.kind, req.count) {
                Ok(mut reader) => {
                    let mut pb = chunker.begin_packet();
                    pb.write_all(&[Kind::Rread as u8, tag])?;
                    std::io::copy(&mut reader, &mut pb)?;
                    pb.finish()?;
                    reader.done();
                }
                Err(e) => send_error(chunker, tag, &e.to_string())?,
            }
            Ok(Outcome::Continue)
        }
        Kind::Tsync => {
            match handler.sync() {
                Ok(()) => {
                    let reply = message::Rsync { tag };
                    write_packet(chunker, |w| reply.encode(w))?;
                }
                Err(e) => send_error(chunker, tag, &e.to_string())?,
            }
            Ok(Outcome::Continue)
        }
        Kind::Tping => {
            let reply = message::Rping { tag };
            write_packet(chunker, |w| reply.encode(w))?;
            Ok(Outcome::Continue)
        }
        Kind::Tgoodbye => Ok(Outcome::Goodbye),
        other => {
            send_error(chunker, tag, &format!("unexpected type {:?}", other))?;
            Err(ProtocolError::Invalid(format!(
                "unexpected type {other:?}"
            )))
        }
    }
}

fn write_packet<T: std::io::Write>(
    chunker: &Chunker<T>,
    encode: impl FnOnce(&mut PacketBuilder<'_, T>) -> Result<(), ProtocolError>,
) -> Result<(), ProtocolError> {
    let mut pb = chunker.begin_packet();
    encode(&mut pb)?;
    pb.finish()?;
    Ok(())
}

fn send_error<T: std::io::Write>(chunker: &Chunker<T>, tag: u8, text: &str) -> Result<(), ProtocolError> {
    let reply = message::Rerror {
        tag,
        text: text.to_string(),
    };
    write_packet(chunker, |w| reply.encode(w))
}
