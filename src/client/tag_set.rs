//! Allocation and reply routing for the 8-bit tags that identify in-flight
//! client requests.

use std::sync::Mutex;

use futures::channel::oneshot;

/// Number of tags a connection can have outstanding at once: the whole
/// range of a `u8`.
const NUM_TAGS: usize = 256;

/// A raw reply packet, handed to whichever tag it answers.
pub type Reply = Vec<u8>;

struct Inner {
    next: u8,
    waiters: Vec<Option<oneshot::Sender<Reply>>>,
}

/// The client-side tag allocator and reply router.
///
/// One instance lives per connection. `allocate` is called by any caller
/// thread; `deliver` and `cancel` are called by the receiver thread and by
/// callers whose outbound write failed, respectively.
pub struct TagSet {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSet").finish_non_exhaustive()
    }
}

impl TagSet {
    /// Creates an empty tag set. Allocation starts at tag `0`, matching the
    /// legacy implementation's sensitivity to the starting value.
    pub fn new() -> Self {
        TagSet {
            inner: Mutex::new(Inner {
                next: 0,
                waiters: (0..NUM_TAGS).map(|_| None).collect(),
            }),
        }
    }

    /// Allocates a tag by linear probe starting at the internal cursor,
    /// wrapping through 0, and installs a fresh single-shot waiter for it.
    ///
    /// # Panics
    ///
    /// Panics if all 256 tags are occupied: the protocol offers no queue
    /// beyond its tag space, so saturation is a programmer error in the
    /// caller (too many concurrent requests on one connection).
    pub fn allocate(&self) -> (u8, oneshot::Receiver<Reply>) {
        let mut inner = self.inner.lock().unwrap();
        let mut tag = inner.next;
        for _ in 0..=u8::MAX {
            if inner.waiters[tag as usize].is_none() {
                let (tx, rx) = oneshot::channel();
                inner.waiters[tag as usize] = Some(tx);
                inner.next = tag.wrapping_add(1);
                return (tag, rx);
            }
            tag = tag.wrapping_add(1);
        }
        panic!("venti: too many concurrent requests (256-tag limit exhausted)");
    }

    /// Retires `tag` without a reply, signalling the waiter to abandon its
    /// request. Used when the outbound write for a just-allocated tag
    /// fails.
    pub fn cancel(&self, tag: u8) {
        self.inner.lock().unwrap().waiters[tag as usize] = None;
    }

    /// Delivers `packet` to the waiter registered for `tag`, retiring it.
    ///
    /// If no waiter is registered — a previously-cancelled request, or a
    /// server bug — the reply is dropped and logged, not treated as fatal.
    pub fn deliver(&self, tag: u8, packet: Reply) {
        let waiter = self.inner.lock().unwrap().waiters[tag as usize].take();
        match waiter {
            Some(tx) => {
                let _ = tx.send(packet);
            }
            None => log::warn!("venti: reply for unregistered tag {tag:#x}; dropping"),
        }
    }

    /// Closes every outstanding waiter, signalling "connection closed" to
    /// every in-flight caller. Used once the receiver thread hits a fatal
    /// I/O error or the connection is explicitly closed.
    pub fn close_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        for slot in inner.waiters.iter_mut() {
            *slot = None;
        }
    }
}

impl Default for TagSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_starts_at_zero() {
        let ts = TagSet::new();
        let (tag, _rx) = ts.allocate();
        assert_eq!(tag, 0);
    }

    #[test]
    fn allocate_advances_past_used_slots() {
        let ts = TagSet::new();
        let (t0, _r0) = ts.allocate();
        let (t1, _r1) = ts.allocate();
        assert_eq!(t0, 0);
        assert_eq!(t1, 1);
    }

    #[test]
    fn deliver_retires_slot_for_reuse() {
        let ts = TagSet::new();
        let (tag, rx) = ts.allocate();
        ts.deliver(tag, vec![1, 2, 3]);
        let got = futures::executor::block_on(rx).unwrap();
        assert_eq!(got, vec![1, 2, 3]);

        // The slot is free again; allocating 256 more tags must not panic.
        for _ in 0..256 {
            ts.allocate();
        }
    }

    #[test]
    fn cancel_closes_waiter_without_panicking_on_double_use() {
        let ts = TagSet::new();
        let (tag, rx) = ts.allocate();
        ts.cancel(tag);
        assert!(futures::executor::block_on(rx).is_err());
    }

    #[test]
    fn deliver_to_unregistered_tag_does_not_panic() {
        let ts = TagSet::new();
        ts.deliver(42, vec![]);
    }

    #[test]
    #[should_panic(expected = "too many concurrent requests")]
    fn saturating_all_tags_panics() {
        let ts = TagSet::new();
        let mut _rxs = Vec::new();
        for _ in 0..256 {
            _rxs.push(ts.allocate());
        }
        ts.allocate();
    }

    #[test]
    fn close_all_cancels_every_waiter() {
        let ts = TagSet::new();
        let (_t0, rx0) = ts.allocate();
        let (_t1, rx1) = ts.allocate();
        ts.close_all();
        assert!(futures::executor::block_on(rx0).is_err());
        assert!(futures::executor::block_on(rx1).is_err());
    }
}
