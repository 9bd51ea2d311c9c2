//! Stack-allocated move list.
//!
//! Each perft node creates a `MoveList` on the stack (about 1KB) instead of
//! allocating a Vec on the heap. Removal keeps the relative order of the
//! remaining moves, which the legality filter relies on.

use crate::types::Move;

/// Maximum number of moves in any legal chess position.
/// The theoretical maximum is 218, but 256 provides nice alignment.
pub const MAX_MOVES: usize = 256;

#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    count: usize,
}

impl MoveList {
    /// Create a new empty move list.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            moves: [Move::NONE; MAX_MOVES],
            count: 0,
        }
    }

    /// Add a move to the list.
    ///
    /// Panics once [`MAX_MOVES`] moves are stored. No legal position gets close.
    #[inline(always)]
    pub fn push(&mut self, mv: Move) {
        assert!(self.count < MAX_MOVES, "MoveList overflow: more than {MAX_MOVES} moves");
        self.moves[self.count] = mv;
        self.count += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get a move by index (copy by value - 4 bytes).
    #[inline(always)]
    pub fn get(&self, idx: usize) -> Move {
        debug_assert!(idx < self.count, "MoveList index out of bounds");
        self.moves[idx]
    }

    /// Remove the move at `idx`, shifting the tail down one slot.
    #[inline]
    pub fn remove(&mut self, idx: usize) -> Move {
        assert!(idx < self.count, "MoveList::remove index {idx} out of bounds");
        let mv = self.moves[idx];
        self.moves.copy_within(idx + 1..self.count, idx);
        self.count -= 1;
        mv
    }

    /// Clear the list (reset count, no need to clear data).
    #[inline(always)]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// In-place filter: keep only moves for which the predicate returns true.
    /// Survivors keep their relative order.
    #[inline]
    pub fn retain<F: FnMut(Move) -> bool>(&mut self, mut f: F) {
        let mut write_idx = 0;
        for read_idx in 0..self.count {
            let mv = self.moves[read_idx];
            if f(mv) {
                self.moves[write_idx] = mv;
                write_idx += 1;
            }
        }
        self.count = write_idx;
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.count]
    }

    /// Iterate over all moves (by value).
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, Move>> {
        self.as_slice().iter().copied()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = Move;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveList")
            .field("count", &self.count)
            .field(
                "moves",
                &self.as_slice()[..self.count.min(10)]
                    .iter()
                    .map(|m| m.to_long_algebraic())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceType;

    fn sample() -> MoveList {
        let mut list = MoveList::new();
        list.push(Move::new_quiet(12, 28, PieceType::Pawn)); // e2e4
        list.push(Move::new_quiet(12, 20, PieceType::Pawn)); // e2e3
        list.push(Move::new(6, 21, PieceType::Knight, Some(PieceType::Pawn))); // g1xf3
        list.push(Move::new_quiet(1, 18, PieceType::Knight)); // b1c3
        list
    }

    #[test]
    fn test_movelist_basic() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        list.push(Move::new_quiet(12, 28, PieceType::Pawn));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).to_long_algebraic(), "e2e4");
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_movelist_remove_preserves_order() {
        let mut list = sample();
        let removed = list.remove(1);
        assert_eq!(removed.to_long_algebraic(), "e2e3");
        let names: Vec<String> = list.iter().map(|m| m.to_long_algebraic()).collect();
        assert_eq!(names, vec!["e2e4", "g1f3", "b1c3"]);

        list.remove(2);
        assert_eq!(list.len(), 2);
        assert!(!list.contains(Move::new_quiet(1, 18, PieceType::Knight)));
    }

    #[test]
    #[should_panic]
    fn test_movelist_remove_out_of_bounds() {
        let mut list = sample();
        list.remove(4);
    }

    #[test]
    #[should_panic(expected = "MoveList overflow")]
    fn test_movelist_push_past_capacity() {
        let mut list = MoveList::new();
        for _ in 0..=MAX_MOVES {
            list.push(Move::new_quiet(12, 28, PieceType::Pawn));
        }
    }

    #[test]
    fn test_movelist_retain() {
        let mut list = sample();
        list.retain(|m| !m.is_capture());
        let names: Vec<String> = list.iter().map(|m| m.to_long_algebraic()).collect();
        assert_eq!(names, vec!["e2e4", "e2e3", "b1c3"]);
    }

    #[test]
    fn test_movelist_iter() {
        let list = sample();
        assert_eq!(list.iter().len(), 4);
        assert_eq!((&list).into_iter().filter(|m| m.piece() == PieceType::Knight).count(), 2);
    }
}
