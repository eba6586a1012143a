//! Fixed-size bitmap tracking which chunk indices have arrived.

/// Set of received chunk indices for a session with a known chunk count.
///
/// One bit per expected chunk, plus a running count so progress checks
/// never rescan the words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBitmap {
    words: Vec<u64>,
    len: u32,
    count: u32,
}

impl ChunkBitmap {
    /// Create an empty bitmap for `len` expected chunks.
    pub fn new(len: u32) -> Self {
        let words = vec![0u64; (len as usize + 63) / 64];
        Self { words, len, count: 0 }
    }

    /// Number of expected chunks.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Number of distinct indices received so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True once every expected index has been set.
    pub fn is_full(&self) -> bool {
        self.count == self.len
    }

    pub fn contains(&self, index: u32) -> bool {
        if index >= self.len {
            return false;
        }
        let word = self.words[(index / 64) as usize];
        word & (1 << (index % 64)) != 0
    }

    /// Mark an index as received. Returns `true` if it was newly set,
    /// `false` if it was already present or out of range.
    pub fn set(&mut self, index: u32) -> bool {
        if index >= self.len {
            return false;
        }
        let word = &mut self.words[(index / 64) as usize];
        let mask = 1 << (index % 64);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.count += 1;
        true
    }

    /// Indices not yet received, in ascending order.
    pub fn missing(&self) -> Vec<u32> {
        (0..self.len).filter(|i| !self.contains(*i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let bitmap = ChunkBitmap::new(10);
        assert!(bitmap.is_empty());
        assert!(!bitmap.is_full());
        assert_eq!(bitmap.count(), 0);
        assert_eq!(bitmap.missing(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn set_is_idempotent() {
        let mut bitmap = ChunkBitmap::new(3);
        assert!(bitmap.set(1));
        assert!(!bitmap.set(1));
        assert_eq!(bitmap.count(), 1);
        assert!(bitmap.contains(1));
        assert!(!bitmap.contains(0));
    }

    #[test]
    fn fills_in_any_order() {
        let mut bitmap = ChunkBitmap::new(3);
        bitmap.set(2);
        bitmap.set(0);
        assert_eq!(bitmap.missing(), vec![1]);
        bitmap.set(1);
        assert!(bitmap.is_full());
        assert!(bitmap.missing().is_empty());
    }

    #[test]
    fn spans_word_boundaries() {
        let mut bitmap = ChunkBitmap::new(130);
        bitmap.set(0);
        bitmap.set(63);
        bitmap.set(64);
        bitmap.set(129);
        assert_eq!(bitmap.count(), 4);
        assert!(bitmap.contains(63));
        assert!(bitmap.contains(64));
        assert!(bitmap.contains(129));
        assert!(!bitmap.contains(128));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut bitmap = ChunkBitmap::new(4);
        assert!(!bitmap.set(4));
        assert!(!bitmap.contains(4));
        assert_eq!(bitmap.count(), 0);
    }
}
