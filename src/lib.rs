//! A pure Rust implementation of the Venti block-storage protocol, suitable
//! for writing clients and servers that speak to each other (or to a real
//! Plan 9 `venti(7)` server) over a length-framed TCP stream.
//!
//! Venti stores immutable blocks of data, indexed by the SHA-1 hash ("score")
//! of their contents. This crate implements the wire protocol only: framing,
//! the message codec, the client's tagged request multiplexer, and the
//! server's connection state machine. Persistence is delegated entirely to a
//! user-supplied [`server::Handler`].

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{Client, ClientError};
pub use protocol::{Entry, Score, Type};
pub use server::{serve, Handler, HandlerError, Handshake, Rhello, Thello};

/// The default TCP port a Venti server listens on.
pub const DEFAULT_PORT: u16 = 17034;

/// Returns the default dial/listen address, `[::1]:17034`.
pub fn default_addr() -> std::net::SocketAddr {
    std::net::SocketAddr::from((std::net::Ipv6Addr::LOCALHOST, DEFAULT_PORT))
}
