//! Buffer pool: a fixed set of reusable line batches shared by the reader and the workers.
//!
//! Every batch is allocated in [`BufferPool::new`] and lives until the pool and all its
//! clones are dropped. Ownership moves by value at every hand-off (pool → reader → channel →
//! worker → pool), so a batch can never be reachable from two stages at once.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity run of lines with an explicit valid length.
///
/// Slots past [`Batch::len`] may still hold lines from an earlier use; they are never exposed.
/// Slot strings keep their allocation across reuse.
#[derive(Debug)]
pub struct Batch {
    slots: Vec<String>,
    len: usize,
}

impl Batch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![String::new(); capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of valid lines.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// The valid lines, in insertion order.
    pub fn lines(&self) -> &[String] {
        &self.slots[..self.len]
    }

    /// Copy `line` into the next slot. Returns false when the batch is full.
    pub fn push(&mut self, line: &str) -> bool {
        match self.next_slot() {
            Some(slot) => {
                slot.push_str(line);
                self.commit();
                true
            }
            None => false,
        }
    }

    /// Cleared slot at the valid length for in-place filling, or None when full.
    /// The slot only becomes part of the batch after [`Batch::commit`].
    pub fn next_slot(&mut self) -> Option<&mut String> {
        let slot = self.slots.get_mut(self.len)?;
        slot.clear();
        Some(slot)
    }

    /// Make the slot returned by the last [`Batch::next_slot`] valid.
    pub fn commit(&mut self) {
        debug_assert!(self.len < self.slots.len(), "commit on a full batch");
        self.len = (self.len + 1).min(self.slots.len());
    }

    /// Mark the batch empty. Slot contents and allocations are kept.
    pub fn reset(&mut self) {
        self.len = 0;
    }
}

/// Bounded free list of [`Batch`]es. Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct BufferPool {
    free_tx: Sender<Batch>,
    free_rx: Receiver<Batch>,
    capacity: usize,
    outstanding: Arc<AtomicUsize>,
    peak_outstanding: Arc<AtomicUsize>,
}

impl BufferPool {
    /// Allocate `pool_size` batches of `packet_size` slots each. Both must be at least 1.
    pub fn new(pool_size: usize, packet_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        let packet_size = packet_size.max(1);
        let (free_tx, free_rx) = bounded::<Batch>(pool_size);
        for _ in 0..pool_size {
            // Capacity equals the batch count, so this never blocks or fails.
            let _ = free_tx.send(Batch::with_capacity(packet_size));
        }
        Self {
            free_tx,
            free_rx,
            capacity: pool_size,
            outstanding: Arc::new(AtomicUsize::new(0)),
            peak_outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a free batch, blocking until one is released. The batch comes back empty.
    pub fn acquire(&self) -> Batch {
        // The pool owns a sender, so the free list never disconnects while `self` lives.
        let mut batch = match self.free_rx.recv() {
            Ok(batch) => batch,
            Err(_) => unreachable!("buffer pool free list disconnected"),
        };
        batch.reset();
        let now = self.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_outstanding.fetch_max(now, Ordering::AcqRel);
        batch
    }

    /// Take a free batch if one is available right now.
    pub fn try_acquire(&self) -> Option<Batch> {
        let mut batch = self.free_rx.try_recv().ok()?;
        batch.reset();
        let now = self.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_outstanding.fetch_max(now, Ordering::AcqRel);
        Some(batch)
    }

    /// Return a batch to the pool. Never blocks: at most `capacity` batches exist.
    pub fn release(&self, batch: Batch) {
        // Decrement first so a concurrent acquire can't push the count past capacity.
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        if self.free_tx.try_send(batch).is_err() {
            self.outstanding.fetch_add(1, Ordering::AcqRel);
            log::warn!("buffer pool full on release; dropping a batch that did not come from it");
        }
    }

    /// Total batches owned by the pool (free + outstanding).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Batches currently sitting in the free list.
    pub fn free_count(&self) -> usize {
        self.free_rx.len()
    }

    /// Batches currently held by the reader, a worker or the batch channel.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Most batches outstanding at any one time so far.
    pub fn peak_outstanding(&self) -> usize {
        self.peak_outstanding.load(Ordering::Acquire)
    }
}
