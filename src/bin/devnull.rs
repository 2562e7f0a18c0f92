//! A server that accepts any block and immediately discards it, replying
//! with the score the data would have been assigned.
//!
//! Useful for benchmarking a client without paying for real storage.
//!
//!     devnull [-a addr] [-V]

use venti::{HandlerError, Rhello, Score, Thello, Type};

struct DevNull {
    verbose: bool,
}

impl venti::Handler for DevNull {
    fn write(&self, _kind: Type, data: &[u8]) -> Result<Score, HandlerError> {
        use sha1::{Digest, Sha1};
        let score = Score::from_bytes(Sha1::digest(data).to_vec());
        if self.verbose {
            eprintln!("discarded block with score {}", score);
        }
        Ok(score)
    }

    fn read(&self, _score: &Score, _kind: Type, _count: u32) -> Result<Box<dyn venti::server::BlockReader>, HandlerError> {
        Err("no such block".into())
    }

    fn sync(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut addr = format!("[::]:{}", venti::DEFAULT_PORT);
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" => {
                i += 1;
                addr = args.get(i).unwrap_or_else(|| usage(&args[0])).clone();
            }
            "-V" => verbose = true,
            other => {
                eprintln!("unrecognized argument: {other}");
                usage(&args[0]);
            }
        }
        i += 1;
    }

    let handshake = move |_req: &Thello| -> Result<(Option<Rhello>, Box<dyn venti::Handler>), HandlerError> {
        Ok((None, Box::new(DevNull { verbose })))
    };

    if let Err(e) = venti::serve(addr, handshake) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn usage(prog: &str) -> ! {
    eprintln!("usage: {prog} [-a addr] [-V]");
    std::process::exit(2);
}
