//! Error types for position parsing, move resolution and table construction.

use thiserror::Error;

use crate::bitboard::{sq_to_algebraic, Bitboard, Square};
use crate::magic::Slider;

/// Error type for FEN parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN must have 4 to 6 space separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("Invalid piece character '{0}' in FEN")]
    InvalidPiece(char),
    #[error("FEN board must have 8 ranks, found {found}")]
    RankCount { found: usize },
    #[error("Rank {rank} of the FEN board does not describe exactly 8 files")]
    RankWidth { rank: usize },
    #[error("Invalid side to move '{0}', expected 'w' or 'b'")]
    InvalidSideToMove(String),
    #[error("Invalid castling field '{0}'")]
    InvalidCastling(String),
    #[error("Invalid en passant square '{0}'")]
    InvalidEnPassant(String),
    #[error("Invalid {field} counter '{value}'")]
    InvalidCounter { field: &'static str, value: String },
}

/// Error type for resolving a move given as text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("'{0}' is not a move in long algebraic notation (e.g. e2e4, e7e8q)")]
    Syntax(String),
    #[error("'{0}' is not a legal move in this position")]
    Illegal(String),
    #[error("there is no move to take back")]
    NothingToUndo,
    #[error("'{requested}' is not the last move played (last was '{last}')")]
    NotLastMove { requested: String, last: String },
}

fn square_name(sq: &Square) -> String {
    sq_to_algebraic(*sq)
}

/// Failure to build the precomputed tables. Nothing can be generated without them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("no collision-free {slider:?} magic found for {} after {attempts} attempts", square_name(.square))]
    MagicNotFound {
        slider: Slider,
        square: Square,
        attempts: u32,
    },
    #[error("{slider:?} table for {} disagrees with a ray walk for occupancy {occupied:#018x}", square_name(.square))]
    WrongAttacks {
        slider: Slider,
        square: Square,
        occupied: Bitboard,
    },
}
