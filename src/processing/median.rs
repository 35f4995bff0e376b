//! Streaming median filter over raw RTT observations
//!
//! One median buffer per remote peer smooths measurement spikes before they
//! reach the coordinate update. The buffer couples two structures over the
//! same backing array: a ring buffer indexed by `cursor` that expires the
//! oldest sample, and a sorted doubly-linked list threaded through the same
//! slots via `prev`/`next` indices that keeps ascending value order. One
//! push costs O(window) with no allocation after the buffer exists.

use std::collections::HashMap;
use std::hash::Hash;

use num_traits::Float;
use tracing::debug;

/// Index used for the link fields of a slot that is not on the sorted list.
/// The window size itself is an impossible slot index.
const fn sentinel(window: usize) -> usize {
    window
}

#[derive(Debug, Clone, Copy)]
struct Slot<T> {
    value: T,
    prev: usize,
    next: usize,
}

/// Fixed-window streaming median over a single sample stream.
///
/// Values are NaN until samples land; after any push the reported median is
/// a finite member of the current window. For even windows the smaller of
/// the two central values is reported.
#[derive(Debug, Clone)]
pub struct MedianBuffer<T, const W: usize> {
    slots: [Slot<T>; W],
    /// Next ring-buffer slot to overwrite.
    cursor: usize,
    /// Slot holding the smallest live value.
    head: usize,
    /// Slot holding the current median.
    median: usize,
}

impl<T: Float, const W: usize> MedianBuffer<T, W> {
    /// Create an empty buffer: all values NaN, the linked list circular in
    /// slot order.
    pub fn new() -> Self {
        assert!(W > 0, "median window must be at least 1");
        Self {
            slots: std::array::from_fn(|i| Slot {
                value: T::nan(),
                prev: (i + W - 1) % W,
                next: (i + 1) % W,
            }),
            cursor: 0,
            head: 0,
            median: 0,
        }
    }

    /// Ingest one sample and return the new median.
    ///
    /// Panics if `datum` is NaN or infinite.
    pub fn push(&mut self, datum: T) -> T {
        assert!(datum.is_finite(), "median filter samples must be finite");

        // Expire the ring slot about to be overwritten. If it is the list
        // head, the head moves to its successor first.
        let expired = self.cursor;
        if self.head == expired {
            self.head = self.slots[expired].next;
        }
        let (prev, next) = (self.slots[expired].prev, self.slots[expired].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
        self.slots[expired].value = T::nan();
        self.slots[expired].prev = sentinel(W);
        self.slots[expired].next = sentinel(W);

        // Walk the sorted list. The scan cursor looks for the first live
        // slot with value >= datum and re-links the expired slot (now
        // carrying the datum) in front of it; the median cursor trails
        // behind, advancing every other iteration while the scan is still
        // over live slots.
        let mut scan = self.head;
        let mut median = self.head;
        let mut inserted = false;
        for i in 0..W {
            if !inserted
                && (self.slots[scan].value.is_nan()
                    || self.slots[scan].value >= datum
                    || i + 1 == W)
            {
                self.insert_before(expired, scan, datum);
                inserted = true;
                if scan == expired {
                    // The list was empty (window of one); the slot links to
                    // itself and the walk is done.
                    break;
                }
            }
            if i % 2 == 1 && !self.slots[scan].value.is_nan() {
                median = self.slots[median].next;
            }
            scan = self.slots[scan].next;
        }
        self.median = median;

        // A datum at or below the current minimum becomes the new head; the
        // median slides back one slot to compensate for the rank shift.
        let head_value = self.slots[self.head].value;
        if head_value.is_nan() || datum <= head_value {
            self.head = expired;
            self.median = self.slots[self.median].prev;
        }

        // Report the smaller of the two central values for even windows.
        if W % 2 == 0 {
            self.median = self.slots[self.median].prev;
        }

        self.cursor = (self.cursor + 1) % W;

        let result = self.slots[self.median].value;
        assert!(!result.is_nan(), "median buffer produced a NaN median");
        result
    }

    /// Link `slot` (carrying `datum`) into the sorted list just before
    /// `position`. When the list is empty the slot links to itself.
    fn insert_before(&mut self, slot: usize, position: usize, datum: T) {
        self.slots[slot].value = datum;
        if position == slot {
            self.slots[slot].prev = slot;
            self.slots[slot].next = slot;
            self.head = slot;
        } else {
            let prev = self.slots[position].prev;
            self.slots[slot].prev = prev;
            self.slots[slot].next = position;
            self.slots[prev].next = slot;
            self.slots[position].prev = slot;
        }
    }

    /// The current median, or NaN before the first push.
    pub fn median(&self) -> T {
        self.slots[self.median].value
    }

    /// The smallest live value, or NaN before the first push.
    pub fn min(&self) -> T {
        self.slots[self.head].value
    }

    /// The largest live value, or NaN before the first push.
    pub fn max(&self) -> T {
        let mut idx = self.head;
        loop {
            let next = self.slots[idx].next;
            if next == self.head || self.slots[next].value.is_nan() {
                return self.slots[idx].value;
            }
            idx = next;
        }
    }
}

impl<T: Float, const W: usize> Default for MedianBuffer<T, W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-peer streaming median filter.
///
/// Keyed by any hashable peer identifier; a buffer is created lazily the
/// first time a peer is observed and lives until [`discard`](Self::discard)
/// or [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct LatencyFilter<K, T, const W: usize> {
    buffers: HashMap<K, MedianBuffer<T, W>>,
}

impl<K: Eq + Hash, T: Float, const W: usize> LatencyFilter<K, T, W> {
    /// Create an empty filter. Panics if `W` is zero.
    pub fn new() -> Self {
        assert!(W > 0, "latency filter window must be at least 1");
        Self {
            buffers: HashMap::new(),
        }
    }

    /// Ingest one RTT observation for `key` and return the filtered value.
    ///
    /// Panics if `rtt` is NaN or infinite.
    pub fn push(&mut self, key: K, rtt: T) -> T {
        let buffer = self.buffers.entry(key).or_insert_with(|| {
            debug!("creating median buffer for newly observed peer");
            MedianBuffer::new()
        });
        buffer.push(rtt)
    }

    /// Current median for `key`, or NaN if the peer is unknown.
    pub fn get(&self, key: &K) -> T {
        self.buffers
            .get(key)
            .map(MedianBuffer::median)
            .unwrap_or_else(T::nan)
    }

    /// Smallest sample in the window for `key`, or NaN if unknown.
    pub fn min(&self, key: &K) -> T {
        self.buffers
            .get(key)
            .map(MedianBuffer::min)
            .unwrap_or_else(T::nan)
    }

    /// Largest sample in the window for `key`, or NaN if unknown.
    pub fn max(&self, key: &K) -> T {
        self.buffers
            .get(key)
            .map(MedianBuffer::max)
            .unwrap_or_else(T::nan)
    }

    /// Drop the buffer for a single peer. Unknown keys are a no-op.
    pub fn discard(&mut self, key: &K) {
        if self.buffers.remove(key).is_some() {
            debug!("discarded median buffer");
        }
    }

    /// Drop all buffers.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    /// Number of peers currently tracked.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// True when no peers are tracked.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl<K: Eq + Hash, T: Float, const W: usize> Default for LatencyFilter<K, T, W> {
    fn default() -> Self {
        Self::new()
    }
}
