//! The data model shared by both peers: scores, block types, and directory
//! entries.

use std::fmt;

/// The length, in bytes, of a SHA-1 score.
pub const SCORE_SIZE: usize = 20;

/// The identity of a block: the SHA-1 hash of its contents.
///
/// A zero-length score means "none" (not yet computed, or "no such block"
/// for a missing read). Any other length that isn't [`SCORE_SIZE`] is
/// malformed but is accepted by the decoder for forward compatibility with
/// future hash families; it is up to callers to reject it if they care.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Score(Vec<u8>);

impl Score {
    /// The reserved all-zero score, used to mean "no such block" on a read.
    pub fn zero() -> Self {
        Score(vec![0u8; SCORE_SIZE])
    }

    /// The empty score, meaning "none" / "not yet computed".
    pub fn none() -> Self {
        Score(Vec::new())
    }

    /// Wraps a raw byte sequence as a score, without validating its length.
    pub fn from_bytes(b: impl Into<Vec<u8>>) -> Self {
        Score(b.into())
    }

    /// The raw bytes of the score.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True if this is the empty "none" score.
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// True if this is the all-zero score reserved for "no such block".
    pub fn is_zero(&self) -> bool {
        self.0.len() == SCORE_SIZE && self.0.iter().all(|&b| b == 0)
    }
}

impl From<Vec<u8>> for Score {
    fn from(b: Vec<u8>) -> Self {
        Score(b)
    }
}

impl AsRef<[u8]> for Score {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            SCORE_SIZE => {
                write!(f, "sha1!")?;
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            0 => write!(f, "nil"),
            _ => {
                write!(f, "???!")?;
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({})", self)
    }
}

/// The type of a block, classifying how its contents should be interpreted.
///
/// The legacy wire encoding left-shifts these by 3 bits (room for flags that
/// were never assigned); the named constants below match that encoding
/// rather than the small dense `0, 1, 2` one might expect, since decoders
/// must produce the same bytes the reference implementation does.
///
/// This is a transparent wrapper around the wire byte, not a closed set of
/// variants: per §4.3, decoders validate only buffer sufficiency, not
/// semantic plausibility, so a type byte this core doesn't recognize is
/// carried through unchanged rather than rejected at decode time.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Type(
    /// The raw wire byte.
    pub u8,
);

impl Type {
    /// Opaque application data.
    pub const DATA: Type = Type(0);
    /// A directory block: a list of [`Entry`] records.
    pub const DIR: Type = Type(1 << 3);
    /// A root block: the head of a tree of blocks.
    pub const ROOT: Type = Type(2 << 3);
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Type::DATA => write!(f, "Type::Data"),
            Type::DIR => write!(f, "Type::Dir"),
            Type::ROOT => write!(f, "Type::Root"),
            Type(b) => write!(f, "Type({b:#x})"),
        }
    }
}

/// A single entry in a directory block, pointing at a child block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Generation number, incremented when the block at `score` is replaced.
    pub generation: u32,
    /// Size, in blocks, of the entry's data as addressed indirectly (0 for a
    /// direct, single-block entry).
    pub pointer_size: u32,
    /// Size, in bytes, of the data named by this entry.
    pub data_size: u64,
    /// Type of the pointed-to block.
    pub kind: Type,
    /// Entry-specific flags; currently unused by any implemented feature.
    pub flags: u8,
    /// Score of the pointed-to block.
    pub score: Score,
}

/// A root block: the entry point of a tree of blocks, analogous to a
/// filesystem superblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Human-readable name of the tree this root describes.
    pub name: String,
    /// Opaque type tag describing the tree's contents (e.g. a filesystem
    /// identifier string).
    pub kind: Vec<u8>,
    /// Score of the tree's top directory block.
    pub score: Score,
    /// Block size used throughout the tree.
    pub block_size: u32,
    /// Score of the previous root in this tree's history, if any.
    pub prev: Score,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_display_sha1() {
        let s = Score::from_bytes(vec![0xab; SCORE_SIZE]);
        assert_eq!(s.to_string(), format!("sha1!{}", "ab".repeat(SCORE_SIZE)));
    }

    #[test]
    fn score_display_none() {
        assert_eq!(Score::none().to_string(), "nil");
        assert!(Score::none().is_none());
    }

    #[test]
    fn score_display_malformed() {
        let s = Score::from_bytes(vec![1, 2, 3]);
        assert_eq!(s.to_string(), "???!010203");
    }

    #[test]
    fn type_discriminants_match_legacy_shifted_encoding() {
        assert_eq!(Type::DATA.0, 0);
        assert_eq!(Type::DIR.0, 8);
        assert_eq!(Type::ROOT.0, 16);
    }

    #[test]
    fn unrecognized_type_byte_round_trips_unchanged() {
        let t = Type(0x7f);
        assert_eq!(t.0, 0x7f);
        assert_ne!(t, Type::DATA);
    }

    #[test]
    fn zero_score_is_zero_not_none() {
        let z = Score::zero();
        assert!(z.is_zero());
        assert!(!z.is_none());
    }
}
