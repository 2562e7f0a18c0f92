//! A server whose handler fails every request with a fixed error, for
//! exercising a client's error-handling path against a live connection.
//!
//!     errsrv [-a addr]

use venti::{HandlerError, Rhello, Score, Thello, Type};

struct ErrFs(&'static str);

impl venti::Handler for ErrFs {
    fn write(&self, _kind: Type, _data: &[u8]) -> Result<Score, HandlerError> {
        Err(self.0.into())
    }

    fn read(&self, _score: &Score, _kind: Type, _count: u32) -> Result<Box<dyn venti::server::BlockReader>, HandlerError> {
        Err(self.0.into())
    }

    fn sync(&self) -> Result<(), HandlerError> {
        Err(self.0.into())
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut addr = format!("[::]:{}", venti::DEFAULT_PORT);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" => {
                i += 1;
                addr = args.get(i).unwrap_or_else(|| usage(&args[0])).clone();
            }
            other => {
                eprintln!("unrecognized argument: {other}");
                usage(&args[0]);
            }
        }
        i += 1;
    }

    let handshake = |_req: &Thello| -> Result<(Option<Rhello>, Box<dyn venti::Handler>), HandlerError> {
        Ok((None, Box::new(ErrFs("errsrv: this is what you wanted!"))))
    };

    if let Err(e) = venti::serve(addr, handshake) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn usage(prog: &str) -> ! {
    eprintln!("usage: {prog} [-a addr]");
    std::process::exit(2);
}
