//! Enumerators driving the minor search.

/// Ordered selections of `k` distinct indices out of `0..n`.
///
/// Advances like an odometer over the last position first, skipping indices
/// already used by earlier positions. Starts at `[0, 1, .., k-1]`.
#[derive(Debug, Clone)]
pub struct Selection {
    n: usize,
    indices: Vec<usize>,
    ended: bool,
}

impl Selection {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            ended: k > n,
        }
    }

    /// The current selection.
    pub fn current(&self) -> &[usize] {
        &self.indices
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Back to the first selection.
    pub fn reset(&mut self) {
        let k = self.indices.len();
        self.indices = (0..k).collect();
        self.ended = k > self.n;
    }

    /// Moves to the next selection; returns `false` once exhausted.
    pub fn advance(&mut self) -> bool {
        if self.ended {
            return false;
        }
        let k = self.indices.len();
        let mut pos = k;
        while pos > 0 {
            pos -= 1;
            let mut candidate = self.indices[pos] + 1;
            while candidate < self.n && self.indices[..pos].contains(&candidate) {
                candidate += 1;
            }
            if candidate < self.n {
                self.indices[pos] = candidate;
                for q in pos + 1..k {
                    let mut smallest = 0;
                    while self.indices[..q].contains(&smallest) {
                        smallest += 1;
                    }
                    self.indices[q] = smallest;
                }
                return true;
            }
        }
        self.ended = true;
        false
    }
}

/// Set partitions of a list of distinct IDs, as restricted growth strings.
///
/// `blocks()[i]` is the block index of `ids()[i]`; ID `i` shares a block with
/// the first earlier ID carrying the same index. The first partition puts
/// everything in one block, the last puts every ID in its own block.
#[derive(Debug, Clone)]
pub struct IdPartitionEnumerator<T> {
    ids: Vec<T>,
    blocks: Vec<usize>,
    ended: bool,
}

impl<T: Copy> IdPartitionEnumerator<T> {
    pub fn new(ids: Vec<T>) -> Self {
        let blocks = vec![0; ids.len()];
        Self {
            ids,
            blocks,
            ended: false,
        }
    }

    pub fn ids(&self) -> &[T] {
        &self.ids
    }

    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Position of the first ID in the same block as position `pos`.
    pub fn representative(&self, pos: usize) -> usize {
        let block = self.blocks[pos];
        self.blocks.iter().position(|b| *b == block).unwrap_or(pos)
    }

    /// Resets positions `index..` to their smallest values, keeping the prefix.
    pub fn reset_from(&mut self, index: usize) {
        for b in self.blocks.iter_mut().skip(index) {
            *b = 0;
        }
        self.ended = false;
    }

    /// Skips every partition sharing the prefix `blocks()[..=pos]`.
    ///
    /// Returns `false` (and marks the enumerator ended) when no partition
    /// with a larger prefix exists.
    pub fn advance_at(&mut self, pos: usize) -> bool {
        if self.ended || self.ids.is_empty() {
            self.ended = true;
            return false;
        }
        let mut i = pos.min(self.ids.len() - 1);
        while i > 0 {
            let ceiling = self.blocks[..i].iter().copied().max().unwrap_or(0) + 1;
            if self.blocks[i] < ceiling {
                self.blocks[i] += 1;
                self.reset_from(i + 1);
                return true;
            }
            i -= 1;
        }
        self.ended = true;
        false
    }

    /// Moves to the next partition; returns `false` once exhausted.
    pub fn advance(&mut self) -> bool {
        self.advance_at(self.ids.len().saturating_sub(1))
    }

    /// Number of blocks in the current partition.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().copied().max().map_or(0, |m| m + 1)
    }
}
