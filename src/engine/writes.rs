//! Pending writes: an absolute file position and the bytes to place there,
//! accumulated during the walker's read phase and committed as a batch.

/// An absolute file position and a byte sequence to place there.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub position: u64,
    pub bytes: Vec<u8>,
}

impl PendingWrite {
    pub fn new(position: u64, bytes: Vec<u8>) -> Self {
        PendingWrite { position, bytes }
    }
}

/// An ordered batch of pending writes. The walker never produces
/// overlapping writes, but the queue still sorts by position before
/// commit as a defensive measure against insertion-order mistakes.
#[derive(Debug, Default)]
pub struct WriteQueue {
    writes: Vec<PendingWrite>,
}

impl WriteQueue {
    pub fn new() -> Self {
        WriteQueue { writes: Vec::new() }
    }

    pub fn push(&mut self, write: PendingWrite) {
        self.writes.push(write);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Writes in ascending position order (ties allowed).
    pub fn ordered(&self) -> Vec<&PendingWrite> {
        let mut refs: Vec<&PendingWrite> = self.writes.iter().collect();
        refs.sort_by_key(|w| w.position);
        refs
    }
}
