use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::bitboard::{sq_file, Square};
use crate::types::{CastlingRights, Color, PieceType};

const ZOBRIST_SEED: u64 = 0x1234_5678_90AB_CDEF;

/// Zobrist hashing keys for chess positions.
/// These are pseudo-random u64 values XORed together to create a unique hash for each position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZobristKeys {
    /// Keys for each (color, piece_type, square) combination: 2 * 6 * 64 = 768 keys
    /// Indexed as: pieces[color][piece_type][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    /// Key for side to move (XORed when it's black's turn)
    pub side_to_move: u64,
    /// One key per combination of the four castling flags
    pub castling: [u64; 16],
    /// Keys for en passant file (0-7 for files a-h)
    pub en_passant: [u64; 8],
}

impl ZobristKeys {
    /// Keys drawn from a fixed seed, so hashes are stable across runs.
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in pieces.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_to_move = rng.gen();

        let mut castling = [0u64; 16];
        for key in castling.iter_mut().skip(1) {
            *key = rng.gen();
        }

        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.gen();
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }

    /// Get the key for a piece on a square
    #[inline]
    pub fn piece_key(&self, color: Color, piece_type: PieceType, sq: Square) -> u64 {
        self.pieces[color.index()][piece_type.index()][sq as usize]
    }

    #[inline]
    pub fn castling_key(&self, rights: CastlingRights) -> u64 {
        self.castling[(rights.0 & 0xF) as usize]
    }

    #[inline]
    pub fn en_passant_key(&self, target: Square) -> u64 {
        self.en_passant[sq_file(target) as usize]
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zobrist_keys_unique() {
        let keys = ZobristKeys::new();

        assert_ne!(keys.side_to_move, 0);
        assert_eq!(keys.castling_key(CastlingRights::NONE), 0);

        let mut all_keys: Vec<u64> = keys.pieces.iter().flatten().flatten().copied().collect();
        all_keys.push(keys.side_to_move);
        all_keys.extend_from_slice(&keys.castling[1..]);
        all_keys.extend_from_slice(&keys.en_passant);

        let total = all_keys.len();
        all_keys.sort_unstable();
        all_keys.dedup();
        assert_eq!(all_keys.len(), total, "Duplicate Zobrist key found");
    }

    #[test]
    fn test_zobrist_deterministic() {
        // Keys should be the same on repeated initialization
        assert_eq!(ZobristKeys::new(), ZobristKeys::new());
    }

    #[test]
    fn test_key_lookup() {
        let keys = ZobristKeys::new();
        assert_eq!(
            keys.piece_key(Color::Black, PieceType::Queen, 59),
            keys.pieces[1][4][59]
        );
        // e3 and e6 share the e-file key
        assert_eq!(keys.en_passant_key(20), keys.en_passant_key(44));
    }
}
