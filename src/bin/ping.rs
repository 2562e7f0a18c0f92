//! Dials a server and sends a single `Tping`, reporting failure on stderr.
//!
//!     ping [-a addr]

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut addr = venti::default_addr().to_string();

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

    let mut client = match venti::client::dial(addr) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = client.ping() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let _ = client.close();
}

fn usage(prog: &str) -> ! {
    eprintln!("usage: {prog} [-a addr]");
    std::process::exit(2);
}
