//! End-to-end tests driving a real client against a real server over a
//! loopback TCP connection, the way `client_test.go` exercised the original
//! implementation against an in-memory block store.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use rand::Rng;
use sha1::{Digest, Sha1};

use venti::server::BlockReader;
use venti::{Handler, HandlerError, Rhello, Score, Thello, Type};

/// An in-memory block store, standing in for a real arena-backed server.
/// Exists only to drive these tests; it is not part of the protocol core.
#[derive(Default)]
struct MemFs {
    blocks: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl Handler for MemFs {
    fn write(&self, _kind: Type, data: &[u8]) -> Result<Score, HandlerError> {
        let digest = Sha1::digest(data);
        let score = Score::from_bytes(digest.to_vec());
        self.blocks
            .lock()
            .unwrap()
            .insert(score.as_bytes().to_vec(), data.to_vec());
        Ok(score)
    }

    fn read(&self, score: &Score, _kind: Type, _count: u32) -> Result<Box<dyn BlockReader>, HandlerError> {
        match self.blocks.lock().unwrap().get(score.as_bytes()) {
            Some(data) => Ok(Box::new(std::io::Cursor::new(data.clone()))),
            None => Err("no such block".into()),
        }
    }

    fn sync(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// A handler that fails every call with a fixed error, mirroring
/// `ventitest.ErrFS` from the reference implementation.
struct ErrFs(&'static str);

impl Handler for ErrFs {
    fn write(&self, _kind: Type, _data: &[u8]) -> Result<Score, HandlerError> {
        Err(self.0.into())
    }

    fn read(&self, _score: &Score, _kind: Type, _count: u32) -> Result<Box<dyn BlockReader>, HandlerError> {
        Err(self.0.into())
    }

    fn sync(&self) -> Result<(), HandlerError> {
        Err(self.0.into())
    }
}

/// Adapts a shared handler so the same instance can back every connection's
/// handshake closure returns — `Handshake` hands out a fresh `Box<dyn
/// Handler>` per connection, but these tests only ever want one underlying
/// store.
struct ArcHandler(Arc<dyn Handler>);

impl Handler for ArcHandler {
    fn write(&self, kind: Type, data: &[u8]) -> Result<Score, HandlerError> {
        self.0.write(kind, data)
    }

    fn read(&self, score: &Score, kind: Type, count: u32) -> Result<Box<dyn BlockReader>, HandlerError> {
        self.0.read(score, kind, count)
    }

    fn sync(&self) -> Result<(), HandlerError> {
        self.0.sync()
    }
}

/// Binds an ephemeral listener, serves `handler` on it in the background,
/// and returns a client already connected to it.
fn start_server(handler: Arc<dyn Handler>) -> venti::Client<TcpStream> {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let _ = venti::server::serve_on(
            listener,
            move |_req: &Thello| -> Result<(Option<Rhello>, Box<dyn Handler>), HandlerError> {
                let h = handler.clone();
                Ok((None, Box::new(ArcHandler(h))))
            },
        );
    });

    venti::client::dial(addr).unwrap()
}

fn random_block() -> Vec<u8> {
    let mut rng = rand::rng();
    let len = rng.random_range(0..32 * 1024);
    (0..len).map(|_| rng.random()).collect()
}

#[test]
fn ping_succeeds() {
    let client = start_server(Arc::new(MemFs::default()));
    client.ping().expect("ping should succeed against a healthy handler");
}

#[test]
fn write_then_read_round_trip() {
    let client = start_server(Arc::new(MemFs::default()));
    client.ping().unwrap();

    let mut scores = Vec::new();
    for _ in 0..50 {
        let block = random_block();
        let expected = Score::from_bytes(Sha1::digest(&block).to_vec());
        let score = client.write(Type::DATA, block.clone()).expect("write should succeed");
        assert_eq!(score, expected, "write must return the block's SHA-1");
        scores.push((score, block));
    }

    client.sync().expect("sync should report success after all writes");

    for (score, block) in scores {
        let got = client.read(Type::DATA, &score, 4096).expect("read should find the written block");
        assert_eq!(got, block, "read must return exactly the bytes that were written");
    }
}

#[test]
fn handler_error_surfaces() {
    let client = start_server(Arc::new(ErrFs("could not")));
    let err = client.write(Type::DATA, Vec::new()).expect_err("write must fail");
    assert!(
        err.to_string().contains("could not"),
        "error should carry the handler's message, got: {err}"
    );
}

#[test]
fn read_of_unknown_score_is_an_error() {
    let client = start_server(Arc::new(MemFs::default()));
    let zero = Score::zero();
    let err = client
        .read(Type::DATA, &zero, 4096)
        .expect_err("reading an unknown score must fail, not hang or return empty data");
    assert!(!err.to_string().is_empty());
}

#[test]
fn version_mismatch_closes_cleanly() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handler: Arc<dyn Handler> = Arc::new(MemFs::default());

    thread::spawn(move || {
        let _ = venti::server::serve_on(
            listener,
            move |_req: &Thello| -> Result<(Option<Rhello>, Box<dyn Handler>), HandlerError> {
                let h = handler.clone();
                Ok((None, Box::new(ArcHandler(h))))
            },
        );
    });

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"venti-99-nonexistent\n").unwrap();
    stream.flush().unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut server_line = String::new();
    reader.read_line(&mut server_line).unwrap();
    assert!(server_line.starts_with("venti-04-"));

    // With no common version, the server tears the connection down before
    // any Thello/Rhello exchange; the next read observes EOF, not data.
    let mut buf = [0u8; 1];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "server must close the connection on version mismatch");
}
