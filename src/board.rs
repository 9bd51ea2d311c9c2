//! Bitboard position and its make/unmake discipline.
//!
//! A `Board` is mutated in place: `make_move` pushes the irreversible part of the
//! state (castling rights, en passant target, halfmove clock) onto an internal stack
//! and `unmake_move` pops it, so a make followed by the matching unmake restores the
//! board bit for bit. Moves must be retracted in strict LIFO order. [`Board::apply`]
//! wraps the pair in a guard that retracts the move when it goes out of scope.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::bitboard::*;
use crate::types::{CastlingRights, Color, Move, PieceType};
use crate::zobrist::ZobristKeys;

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Irreversible state saved by `make_move`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StateInfo {
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
}

/// Rights that survive a move touching each square
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0xFu8; 64];
    mask[sq::A1 as usize] = !CastlingRights::WHITE_QUEENSIDE & 0xF;
    mask[sq::E1 as usize] = !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE) & 0xF;
    mask[sq::H1 as usize] = !CastlingRights::WHITE_KINGSIDE & 0xF;
    mask[sq::A8 as usize] = !CastlingRights::BLACK_QUEENSIDE & 0xF;
    mask[sq::E8 as usize] = !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE) & 0xF;
    mask[sq::H8 as usize] = !CastlingRights::BLACK_KINGSIDE & 0xF;
    mask
};

/// Rook origin and destination for a castling king landing on `king_to`
#[inline]
pub fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        sq::G1 => (sq::H1, sq::F1),
        sq::C1 => (sq::A1, sq::D1),
        sq::G8 => (sq::H8, sq::F8),
        _ => (sq::A8, sq::D8),
    }
}

/// Square of the pawn removed by an en passant capture landing on `to`
#[inline(always)]
pub const fn en_passant_victim(to: Square) -> Square {
    // one rank behind the target from the capturer's point of view
    to ^ 8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Piece sets indexed `[color][piece type]`
    pub(crate) pieces: [[Bitboard; 6]; 2],
    /// Union of each color's piece sets
    pub(crate) occupancy: [Bitboard; 2],
    pub(crate) occupied: Bitboard,
    // who's move it is
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    // number of half moves since last capture or pawn advance
    pub(crate) halfmove_clock: u32,
    // number of full moves. Starts at 1, and gets incremented after every black move
    pub(crate) fullmove_number: u32,
    history: Vec<StateInfo>,
}

impl Board {
    /// The standard starting position
    pub fn new() -> Self {
        let mut board = Self::empty();
        let back_rank = [
            (PieceType::Rook, 0x81u64),
            (PieceType::Knight, 0x42),
            (PieceType::Bishop, 0x24),
            (PieceType::Queen, 0x08),
            (PieceType::King, 0x10),
        ];
        for (piece, bb) in back_rank {
            board.pieces[Color::White.index()][piece.index()] = bb;
            board.pieces[Color::Black.index()][piece.index()] = bb << 56;
        }
        board.pieces[Color::White.index()][PieceType::Pawn.index()] = RANK_2;
        board.pieces[Color::Black.index()][PieceType::Pawn.index()] = RANK_7;
        board.castling = CastlingRights::ALL;
        board.refresh_occupancy();
        board
    }

    /// A board with no pieces, white to move, no rights
    pub fn empty() -> Self {
        Board {
            pieces: [[EMPTY; 6]; 2],
            occupancy: [EMPTY; 2],
            occupied: EMPTY,
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::with_capacity(64),
        }
    }

    /// Recompute the derived occupancy sets from the piece sets
    pub(crate) fn refresh_occupancy(&mut self) {
        for color in Color::ALL {
            self.occupancy[color.index()] = self.pieces[color.index()].iter().fold(0, |acc, bb| acc | bb);
        }
        self.occupied = self.occupancy[0] | self.occupancy[1];
    }

    #[inline(always)]
    pub(crate) fn put_piece(&mut self, color: Color, piece: PieceType, sq: Square) {
        let bit = sq_to_bb(sq);
        self.pieces[color.index()][piece.index()] |= bit;
        self.occupancy[color.index()] |= bit;
        self.occupied |= bit;
    }

    #[inline(always)]
    pub(crate) fn remove_piece(&mut self, color: Color, piece: PieceType, sq: Square) {
        let bit = !sq_to_bb(sq);
        self.pieces[color.index()][piece.index()] &= bit;
        self.occupancy[color.index()] &= bit;
        self.occupied &= bit;
    }

    #[inline(always)]
    pub fn pieces(&self, color: Color, piece: PieceType) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    /// All squares occupied by `color`
    #[inline(always)]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline(always)]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves currently applied on top of the position this board was built from
    pub fn ply_depth(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = self.pieces(color, PieceType::King);
        (king != 0).then(|| lsb(king))
    }

    /// Kind of `color`'s piece on `sq`, if any
    #[inline]
    pub fn piece_type_at(&self, color: Color, sq: Square) -> Option<PieceType> {
        let bit = sq_to_bb(sq);
        if self.occupancy(color) & bit == 0 {
            return None;
        }
        PieceType::ALL
            .into_iter()
            .find(|piece| self.pieces(color, *piece) & bit != 0)
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Color, PieceType)> {
        Color::ALL
            .into_iter()
            .find_map(|color| self.piece_type_at(color, sq).map(|piece| (color, piece)))
    }

    /// Is `color`'s king on a square of `enemy_attacks`
    #[inline(always)]
    pub fn is_check(&self, color: Color, enemy_attacks: Bitboard) -> bool {
        self.pieces(color, PieceType::King) & enemy_attacks != 0
    }

    /// Color of the piece standing on `sq`. White unless a black piece is there.
    #[inline(always)]
    fn owner_of(&self, sq: Square) -> Color {
        if contains(self.occupancy(Color::Black), sq) {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Apply a move generated for this exact position.
    ///
    /// The mover is the owner of the origin square, so moves generated for the side
    /// not to move are applied (and retracted) for the right color too.
    pub fn make_move(&mut self, mv: Move) {
        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();
        let us = self.owner_of(from);
        let them = us.other();

        self.history.push(StateInfo {
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
        });

        if let Some(captured) = mv.captured() {
            let victim = if mv.is_en_passant() { en_passant_victim(to) } else { to };
            self.remove_piece(them, captured, victim);
        }

        self.remove_piece(us, piece, from);
        self.put_piece(us, mv.promotion().unwrap_or(piece), to);

        if mv.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(to);
            self.remove_piece(us, PieceType::Rook, rook_from);
            self.put_piece(us, PieceType::Rook, rook_to);
        }

        self.castling
            .restrict(CASTLING_MASK[from as usize] & CASTLING_MASK[to as usize]);
        self.en_passant = mv.is_double_push().then(|| (from + to) / 2);

        if piece == PieceType::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = them;
    }

    /// Retract the most recently made move. `mv` must be that move.
    pub fn unmake_move(&mut self, mv: Move) {
        let Some(state) = self.history.pop() else {
            panic!("unmake_move({mv}) without a matching make_move");
        };

        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();
        // the moved (or promoted) piece now stands on the destination
        let us = self.owner_of(to);
        let them = us.other();

        if mv.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(to);
            self.remove_piece(us, PieceType::Rook, rook_to);
            self.put_piece(us, PieceType::Rook, rook_from);
        }

        self.remove_piece(us, mv.promotion().unwrap_or(piece), to);
        self.put_piece(us, piece, from);

        if let Some(captured) = mv.captured() {
            let victim = if mv.is_en_passant() { en_passant_victim(to) } else { to };
            self.put_piece(them, captured, victim);
        }

        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        self.side_to_move = state.side_to_move;
        self.castling = state.castling;
        self.en_passant = state.en_passant;
        self.halfmove_clock = state.halfmove_clock;
    }

    /// Make `mv` and return a guard that unmakes it when dropped.
    #[inline]
    pub fn apply(&mut self, mv: Move) -> MoveGuard<'_> {
        self.make_move(mv);
        MoveGuard { board: self, mv }
    }

    /// Zobrist hash of the position (pieces, side to move, castling, en passant file)
    pub fn hash(&self, keys: &ZobristKeys) -> u64 {
        let mut hash = 0u64;
        for color in Color::ALL {
            for piece in PieceType::ALL {
                for sq in BitboardIter(self.pieces(color, piece)) {
                    hash ^= keys.piece_key(color, piece, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= keys.side_to_move;
        }
        hash ^= keys.castling_key(self.castling);
        if let Some(target) = self.en_passant {
            hash ^= keys.en_passant_key(target);
        }
        hash
    }

    /// Structural invariants: no square is claimed twice and the derived sets match.
    pub fn is_consistent(&self) -> bool {
        let mut seen = EMPTY;
        for color in Color::ALL {
            let mut union = EMPTY;
            for piece in PieceType::ALL {
                let bb = self.pieces(color, piece);
                if seen & bb != 0 {
                    return false;
                }
                seen |= bb;
                union |= bb;
            }
            if union != self.occupancy(color) {
                return false;
            }
        }
        seen == self.occupied && self.occupancy[0] & self.occupancy[1] == 0
    }

    pub fn draw_board(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            out.push_str(&format!("{} ", rank + 1));
            for file in 0..8u8 {
                let c = match self.piece_at(make_sq(rank, file)) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                out.push(' ');
                out.push(c);
            }
            out.push('\n');
        }
        out.push_str("   a b c d e f g h\n");
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.draw_board())
    }
}

/// A move applied to a board for the lifetime of the guard.
pub struct MoveGuard<'a> {
    board: &'a mut Board,
    mv: Move,
}

impl MoveGuard<'_> {
    pub fn applied_move(&self) -> Move {
        self.mv
    }
}

impl Deref for MoveGuard<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.board.unmake_move(self.mv);
    }
}
