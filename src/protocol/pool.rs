//! A small thread-safe free-list of reusable packet buffers.
//!
//! Receive buffers are allocated by the connection's single reader and
//! released by whichever thread finishes consuming a reply (the receiver
//! thread for a dropped/unwanted reply, or the caller for one it read out).
//! A [`Mutex`] around a `Vec` is plenty for this: gets and puts are rare
//! relative to the I/O they bracket.

use std::sync::Mutex;

/// The buffer capacity new pool entries are allocated with.
const INITIAL_BUF_SIZE: usize = 4096;

/// A pool of reusable `Vec<u8>` buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a buffer from the pool, allocating a new one if it's empty.
    pub fn get(&self) -> Vec<u8> {
        self.free
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_BUF_SIZE))
    }

    /// Returns a buffer to the pool for reuse, clearing its contents first.
    pub fn put(&self, mut buf: Vec<u8>) {
        buf.clear();
        self.free.lock().unwrap().push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_returned_buffers() {
        let pool = BufferPool::new();
        let mut buf = pool.get();
        buf.extend_from_slice(b"hello");
        pool.put(buf);

        let buf2 = pool.get();
        assert!(buf2.is_empty());
        assert!(buf2.capacity() >= 5);
    }
}
