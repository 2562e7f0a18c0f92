//! Big-endian primitive and composite encode/decode helpers shared by the
//! message codec.
//!
//! Every function here returns (or is handed) the number of bytes it
//! consumed or produced, so callers can compose several calls by advancing a
//! running offset, the same way the underlying wire format is built up.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io::{self, Read, Write};

use super::ProtocolError;

/// Maximum length of a `string` field on the wire.
pub const MAX_STRING_LEN: usize = 1024;

/// Maximum length of a `short bytes` field on the wire.
pub const MAX_SHORT_BYTES_LEN: usize = 255;

/// Writes a `u16`-length-prefixed UTF-8 string.
///
/// # Panics
///
/// Panics if `s` is longer than [`MAX_STRING_LEN`] bytes: encoding an
/// oversized string is a programmer error, not a runtime condition to
/// recover from.
pub fn write_string<W: Write>(w: &mut W, s: &str) -> Result<usize, ProtocolError> {
    assert!(
        s.len() <= MAX_STRING_LEN,
        "string of {} bytes exceeds the venti protocol's {}-byte limit",
        s.len(),
        MAX_STRING_LEN
    );

    w.write_u16::<BE>(s.len() as u16)?;
    w.write_all(s.as_bytes())?;
    Ok(2 + s.len())
}

/// Reads a `u16`-length-prefixed string. The bytes need not be valid UTF-8;
/// invalid sequences are replaced per [`String::from_utf8_lossy`], since the
/// wire format makes no UTF-8 guarantee and the decoder validates only
/// buffer sufficiency (see §4.3 of the protocol's design notes).
pub fn read_string<R: Read>(r: &mut R) -> Result<(String, usize), ProtocolError> {
    let len = r.read_u16::<BE>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok((String::from_utf8_lossy(&buf).into_owned(), 2 + len))
}

/// Writes a `u8`-length-prefixed byte array.
///
/// # Panics
///
/// Panics if `b` is longer than [`MAX_SHORT_BYTES_LEN`] bytes.
pub fn write_short_bytes<W: Write>(w: &mut W, b: &[u8]) -> Result<usize, ProtocolError> {
    assert!(
        b.len() <= MAX_SHORT_BYTES_LEN,
        "byte array of {} bytes exceeds the venti protocol's {}-byte limit",
        b.len(),
        MAX_SHORT_BYTES_LEN
    );

    w.write_u8(b.len() as u8)?;
    w.write_all(b)?;
    Ok(1 + b.len())
}

/// Reads a `u8`-length-prefixed byte array.
pub fn read_short_bytes<R: Read>(r: &mut R) -> Result<(Vec<u8>, usize), ProtocolError> {
    let len = r.read_u8()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok((buf, 1 + len))
}

/// Reads all remaining bytes of `r` to the end of the packet body, returning
/// the number of bytes read along with the bytes themselves.
pub fn read_to_end<R: Read>(r: &mut R) -> Result<(Vec<u8>, usize), io::Error> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    let n = buf.len();
    Ok((buf, n))
}
