// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded top-k score buffer.

/// One scored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub score: f32,
    pub id: u32,
}

/// Keeps the `k` best-scoring candidates seen so far.
///
/// When full, a candidate scoring no better than the current worst is
/// rejected without reordering, so equal scores keep encounter order.
#[derive(Debug)]
pub struct TopK {
    k: usize,
    items: Vec<Scored>,
}

impl TopK {
    /// Empty buffer of capacity `k`.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k + 1),
        }
    }

    /// Whether the buffer holds `k` candidates.
    #[must_use]
    pub fn full(&self) -> bool {
        self.items.len() >= self.k
    }

    /// Worst retained score, or `f32::NEG_INFINITY` while not full.
    #[must_use]
    pub fn worst(&self) -> f32 {
        if self.full() {
            self.items.last().map_or(f32::NEG_INFINITY, |s| s.score)
        } else {
            f32::NEG_INFINITY
        }
    }

    /// Offer a candidate; keeps the buffer sorted descending by score.
    pub fn offer(&mut self, score: f32, id: u32) {
        if self.k == 0 || (self.full() && score <= self.worst()) {
            return;
        }
        self.items.push(Scored { score, id });
        // Stable sort: an equal-scoring later candidate stays behind the
        // earlier one.
        self.items.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.items.truncate(self.k);
    }

    /// Retained candidates, best first.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Scored> {
        self.items
    }
}
