//! Bit-set primitives.
//!
//! A bitboard is a 64-bit integer where each bit represents a square on the chess board.
//! Square indexing: a1 = 0, b1 = 1, ..., h1 = 7, a2 = 8, ..., h8 = 63
//! This corresponds to: square_index = rank * 8 + file where rank/file are 0-indexed.

/// A set of squares, one bit per square.
pub type Bitboard = u64;

/// A square index in 0..64.
pub type Square = u8;

pub const EMPTY: Bitboard = 0;

pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_B: Bitboard = FILE_A << 1;
pub const FILE_G: Bitboard = FILE_A << 6;
pub const FILE_H: Bitboard = FILE_A << 7;

pub const RANK_1: Bitboard = 0xFF;
pub const RANK_2: Bitboard = RANK_1 << 8;
pub const RANK_7: Bitboard = RANK_1 << 48;
pub const RANK_8: Bitboard = RANK_1 << 56;

pub const NOT_FILE_A: Bitboard = !FILE_A;
pub const NOT_FILE_H: Bitboard = !FILE_H;
pub const NOT_FILE_AB: Bitboard = !(FILE_A | FILE_B);
pub const NOT_FILE_GH: Bitboard = !(FILE_G | FILE_H);

/// Named squares used by castling and tests.
pub mod sq {
    use super::Square;

    pub const A1: Square = 0;
    pub const B1: Square = 1;
    pub const C1: Square = 2;
    pub const D1: Square = 3;
    pub const E1: Square = 4;
    pub const F1: Square = 5;
    pub const G1: Square = 6;
    pub const H1: Square = 7;
    pub const A8: Square = 56;
    pub const B8: Square = 57;
    pub const C8: Square = 58;
    pub const D8: Square = 59;
    pub const E8: Square = 60;
    pub const F8: Square = 61;
    pub const G8: Square = 62;
    pub const H8: Square = 63;
}

/// Build a square index from a 0-indexed rank and file
#[inline(always)]
pub const fn make_sq(rank: u8, file: u8) -> Square {
    rank * 8 + file
}

/// Convert a square index to a bitboard with that single bit set
#[inline(always)]
pub const fn sq_to_bb(sq: Square) -> Bitboard {
    1u64 << sq
}

/// Get the rank (0-7) from a square index
#[inline(always)]
pub const fn sq_rank(sq: Square) -> u8 {
    sq >> 3
}

/// Get the file (0-7) from a square index
#[inline(always)]
pub const fn sq_file(sq: Square) -> u8 {
    sq & 7
}

/// Is the square a member of the set
#[inline(always)]
pub const fn contains(bb: Bitboard, sq: Square) -> bool {
    bb & sq_to_bb(sq) != 0
}

/// Index of the lowest set bit. The caller guarantees `bb != 0`.
#[inline(always)]
pub const fn lsb(bb: Bitboard) -> Square {
    bb.trailing_zeros() as Square
}

#[inline(always)]
pub const fn north(bb: Bitboard) -> Bitboard {
    bb << 8
}

#[inline(always)]
pub const fn south(bb: Bitboard) -> Bitboard {
    bb >> 8
}

#[inline(always)]
pub const fn east(bb: Bitboard) -> Bitboard {
    (bb & NOT_FILE_H) << 1
}

#[inline(always)]
pub const fn west(bb: Bitboard) -> Bitboard {
    (bb & NOT_FILE_A) >> 1
}

/// Square name in algebraic notation, e.g. `e4`
pub fn sq_to_algebraic(sq: Square) -> String {
    format!(
        "{}{}",
        (b'a' + sq_file(sq)) as char,
        (b'1' + sq_rank(sq)) as char
    )
}

/// Parse a square name such as `e4`. Returns `None` for anything else.
pub fn sq_from_algebraic(s: &str) -> Option<Square> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].wrapping_sub(b'a');
    let rank = bytes[1].wrapping_sub(b'1');
    if file < 8 && rank < 8 {
        Some(make_sq(rank, file))
    } else {
        None
    }
}

/// Iterate over set bits in a bitboard, returning square indices
pub struct BitboardIter(pub Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            None
        } else {
            let sq = lsb(self.0);
            self.0 &= self.0 - 1; // Clear the lowest set bit
            Some(sq)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitboardIter {}

/// Render a bitboard as an 8x8 grid, rank 8 on top. Handy in test failures.
pub fn draw(bb: Bitboard) -> String {
    let mut out = String::with_capacity(8 * 17);
    for rank in (0..8).rev() {
        for file in 0..8 {
            out.push(if contains(bb, make_sq(rank, file)) { 'x' } else { '.' });
            if file < 7 {
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_roundtrip_names() {
        assert_eq!(sq_to_algebraic(0), "a1");
        assert_eq!(sq_to_algebraic(63), "h8");
        assert_eq!(sq_to_algebraic(28), "e4");
        assert_eq!(sq_from_algebraic("e4"), Some(28));
        assert_eq!(sq_from_algebraic("h8"), Some(sq::H8));
        assert_eq!(sq_from_algebraic("i1"), None);
        assert_eq!(sq_from_algebraic("a9"), None);
        assert_eq!(sq_from_algebraic("e"), None);
    }

    #[test]
    fn test_shifts_do_not_wrap() {
        let h4 = sq_to_bb(make_sq(3, 7));
        assert_eq!(east(h4), 0);
        let a4 = sq_to_bb(make_sq(3, 0));
        assert_eq!(west(a4), 0);
        assert_eq!(north(sq_to_bb(sq::H8)), 0);
        assert_eq!(south(sq_to_bb(sq::A1)), 0);
    }

    #[test]
    fn test_bitboard_iter() {
        let bb = sq_to_bb(0) | sq_to_bb(7) | sq_to_bb(63); // a1, h1, h8
        let squares: Vec<Square> = BitboardIter(bb).collect();
        assert_eq!(squares, vec![0, 7, 63]);
        assert_eq!(BitboardIter(bb).len(), 3);
    }

    #[test]
    fn test_draw() {
        let drawn = draw(sq_to_bb(sq::A8) | sq_to_bb(sq::H1));
        let lines: Vec<&str> = drawn.lines().collect();
        assert_eq!(lines[0], "x . . . . . . .");
        assert_eq!(lines[7], ". . . . . . . x");
    }
}
