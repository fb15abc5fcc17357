//! Lock-free single-producer/single-consumer byte ring.
//!
//! One execution context writes, one reads, fixed for the ring's lifetime.
//! `split` hands out exactly one `Producer` and one `Consumer`, so a second
//! writer (or reader) cannot be constructed without going through `&mut
//! RingBuffer` again - the borrow checker enforces the SPSC discipline that
//! makes the ring safe without a mutex.
//!
//! Head and tail are monotonically wrapping counters; the element index is
//! `counter % N` and the fill level is their wrapping difference. The
//! producer publishes written bytes with a release store of `tail`, the
//! consumer frees read bytes with a release store of `head`; each side
//! acquire-loads the other's counter before touching the storage.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Fixed-capacity SPSC byte ring. `N` must be a power of two so that the
/// wrapping counters stay aligned with the storage indices.
pub struct RingBuffer<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Read counter, owned by the consumer.
    head: AtomicUsize,
    /// Write counter, owned by the producer.
    tail: AtomicUsize,
    /// Bytes refused by `put` because the ring was full.
    dropped: AtomicU32,
}

// SAFETY: the buffer cell is only written through the single Producer and
// only read through the single Consumer, with acquire/release ordering on
// the counters establishing happens-before for the byte copies.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        assert!(N.is_power_of_two());
        Self {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Split the ring into its producer and consumer halves.
    ///
    /// The halves borrow the ring, so while they exist no other code can
    /// call `split` again or touch the ring directly.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring = &*self;
        (Producer { ring }, Consumer { ring })
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn used(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write half of a ring. Owned by exactly one execution context.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

// SAFETY: a Producer is the only writer of its ring; moving it to another
// context moves the role, it cannot duplicate it.
unsafe impl<const N: usize> Send for Producer<'_, N> {}

impl<const N: usize> Producer<'_, N> {
    /// Copy up to `min(data.len(), free)` bytes in and return the count
    /// actually accepted. Never blocks, never overwrites unread data; the
    /// shortfall is added to the drop counter.
    pub fn put(&mut self, data: &[u8]) -> usize {
        let head = self.ring.head.load(Ordering::Acquire);
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let free = N - tail.wrapping_sub(head);
        let n = data.len().min(free);

        let buf = self.ring.buf.get() as *mut u8;
        for (i, &byte) in data[..n].iter().enumerate() {
            // SAFETY: these slots are outside [head, tail), so the consumer
            // does not read them until the release store below.
            unsafe { *buf.add(tail.wrapping_add(i) % N) = byte };
        }
        self.ring.tail.store(tail.wrapping_add(n), Ordering::Release);

        if n < data.len() {
            self.ring
                .dropped
                .fetch_add((data.len() - n) as u32, Ordering::Relaxed);
        }
        n
    }

    pub fn space_available(&self) -> usize {
        N - self.ring.used()
    }

    /// Total bytes refused so far. Diagnostic only.
    pub fn dropped(&self) -> u32 {
        self.ring.dropped.load(Ordering::Relaxed)
    }
}

/// Read half of a ring. Owned by exactly one execution context.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

// SAFETY: a Consumer is the only reader of its ring.
unsafe impl<const N: usize> Send for Consumer<'_, N> {}

impl<const N: usize> Consumer<'_, N> {
    /// Copy up to `min(out.len(), used)` bytes out and return the count.
    /// Returns 0 when the ring is empty. Never blocks.
    pub fn get(&mut self, out: &mut [u8]) -> usize {
        let tail = self.ring.tail.load(Ordering::Acquire);
        let head = self.ring.head.load(Ordering::Relaxed);
        let used = tail.wrapping_sub(head);
        let n = out.len().min(used);

        let buf = self.ring.buf.get() as *const u8;
        for (i, slot) in out[..n].iter_mut().enumerate() {
            // SAFETY: these slots are inside [head, tail), which the
            // producer does not touch until the release store below.
            *slot = unsafe { *buf.add(head.wrapping_add(i) % N) };
        }
        self.ring.head.store(head.wrapping_add(n), Ordering::Release);
        n
    }

    pub fn is_empty(&self) -> bool {
        self.ring.used() == 0
    }

    pub fn used(&self) -> usize {
        self.ring.used()
    }
}
