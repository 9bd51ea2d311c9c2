//! Attack tables for the non-sliding pieces: knight, king and pawn captures.
//!
//! The per-square tables are built by a `const fn`, so they cost nothing at runtime.
//! The set-wise helpers compute the attacks of a whole piece set at once with
//! wraparound-masked shifts; they are what the attack-map generator uses.

use crate::bitboard::*;
use crate::types::Color;

/// Per-square attack sets for leapers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaperTables {
    /// Knight attacks for each square
    pub knight: [Bitboard; 64],
    /// King attacks for each square
    pub king: [Bitboard; 64],
    /// Pawn capture targets: pawn[color as usize][square]
    pub pawn: [[Bitboard; 64]; 2],
}

// (rank_delta, file_delta)
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

const WHITE_PAWN_DELTAS: [(i8, i8); 2] = [(1, -1), (1, 1)];
const BLACK_PAWN_DELTAS: [(i8, i8); 2] = [(-1, -1), (-1, 1)];

/// Union of the on-board targets reached from `sq` by `deltas`
const fn offsets_from(sq: u8, deltas: &[(i8, i8)]) -> Bitboard {
    let rank = (sq >> 3) as i8;
    let file = (sq & 7) as i8;
    let mut bb = 0u64;
    let mut i = 0;
    while i < deltas.len() {
        let (dr, df) = deltas[i];
        let nr = rank + dr;
        let nf = file + df;
        if nr >= 0 && nr < 8 && nf >= 0 && nf < 8 {
            bb |= 1u64 << (nr * 8 + nf);
        }
        i += 1;
    }
    bb
}

impl LeaperTables {
    /// Build every table at compile time
    pub const fn new() -> Self {
        let mut knight = [0u64; 64];
        let mut king = [0u64; 64];
        let mut pawn = [[0u64; 64]; 2];

        let mut sq: u8 = 0;
        while sq < 64 {
            knight[sq as usize] = offsets_from(sq, &KNIGHT_DELTAS);
            king[sq as usize] = offsets_from(sq, &KING_DELTAS);
            pawn[0][sq as usize] = offsets_from(sq, &WHITE_PAWN_DELTAS);
            pawn[1][sq as usize] = offsets_from(sq, &BLACK_PAWN_DELTAS);
            sq += 1;
        }

        LeaperTables { knight, king, pawn }
    }

    #[inline(always)]
    pub fn knight_attacks(&self, sq: Square) -> Bitboard {
        self.knight[sq as usize]
    }

    #[inline(always)]
    pub fn king_attacks(&self, sq: Square) -> Bitboard {
        self.king[sq as usize]
    }

    #[inline(always)]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn[color.index()][sq as usize]
    }
}

impl Default for LeaperTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Squares attacked by every pawn in `pawns` of the given color
#[inline]
pub fn pawn_attack_mask(color: Color, pawns: Bitboard) -> Bitboard {
    match color {
        Color::White => ((pawns & NOT_FILE_A) << 7) | ((pawns & NOT_FILE_H) << 9),
        Color::Black => ((pawns & NOT_FILE_A) >> 9) | ((pawns & NOT_FILE_H) >> 7),
    }
}

/// Squares attacked by every knight in `knights`
#[inline]
pub fn knight_attack_mask(knights: Bitboard) -> Bitboard {
    ((knights & NOT_FILE_H) << 17)
        | ((knights & NOT_FILE_A) << 15)
        | ((knights & NOT_FILE_GH) << 10)
        | ((knights & NOT_FILE_AB) << 6)
        | ((knights & NOT_FILE_A) >> 17)
        | ((knights & NOT_FILE_H) >> 15)
        | ((knights & NOT_FILE_AB) >> 10)
        | ((knights & NOT_FILE_GH) >> 6)
}

/// Squares attacked by every king in `kings`
#[inline]
pub fn king_attack_mask(kings: Bitboard) -> Bitboard {
    let sideways = east(kings) | west(kings);
    let row = kings | sideways;
    sideways | north(row) | south(row)
}
