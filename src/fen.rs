//! FEN parsing and export.
//!
//! Accepts the usual six fields; the halfmove and fullmove counters may be left
//! off and default to `0 1`. The alias `startpos` names the starting position.

use itertools::Itertools;

use crate::bitboard::{make_sq, sq_from_algebraic, sq_rank, sq_to_algebraic};
use crate::board::Board;
use crate::error::FenError;
use crate::types::{CastlingRights, Color, PieceType};

/// Alias accepted wherever a FEN is expected
pub const STARTPOS: &str = "startpos";

impl Board {
    /// Parse a position description: a FEN string or `startpos`.
    pub fn from_fen(fen_string: &str) -> Result<Board, FenError> {
        let fen_string = fen_string.trim();
        if fen_string == STARTPOS {
            return Ok(Board::new());
        }

        let parts: Vec<&str> = fen_string.split_whitespace().collect();
        if !(4..=6).contains(&parts.len()) {
            return Err(FenError::FieldCount { found: parts.len() });
        }

        let mut board = Board::empty();
        parse_placement(&mut board, parts[0])?;

        let mut side = parts[1].chars();
        board.side_to_move = match (side.next().and_then(Color::from_char), side.next()) {
            (Some(color), None) => color,
            _ => return Err(FenError::InvalidSideToMove(parts[1].to_string())),
        };

        board.castling = parse_castling(parts[2])?;
        board.en_passant = parse_en_passant(parts[3], board.side_to_move)?;

        board.halfmove_clock = match parts.get(4) {
            Some(s) => parse_counter("halfmove", s)?,
            None => 0,
        };
        board.fullmove_number = match parts.get(5) {
            Some(s) => parse_counter("fullmove", s)?,
            None => 1,
        };

        board.refresh_occupancy();
        Ok(board)
    }

    /// Six-field FEN of the current position
    pub fn to_fen(&self) -> String {
        let placement = (0..8u8)
            .rev()
            .map(|rank| {
                let mut row = String::new();
                let mut empty = 0;
                for file in 0..8u8 {
                    match self.piece_at(make_sq(rank, file)) {
                        Some((color, piece)) => {
                            if empty > 0 {
                                row.push_str(&empty.to_string());
                                empty = 0;
                            }
                            row.push(piece.to_fen_char(color));
                        }
                        None => empty += 1,
                    }
                }
                if empty > 0 {
                    row.push_str(&empty.to_string());
                }
                row
            })
            .join("/");

        let en_passant = self
            .en_passant
            .map(sq_to_algebraic)
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side_to_move.to_char(),
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::RankCount { found: rows.len() });
    }

    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file: u32 = 0;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(FenError::RankWidth { rank: rank as usize + 1 });
                }
                file += skip;
            } else {
                let piece = PieceType::from_char(c).ok_or(FenError::InvalidPiece(c))?;
                if file >= 8 {
                    return Err(FenError::RankWidth { rank: rank as usize + 1 });
                }
                board.put_piece(Color::from_case(c), piece, make_sq(rank, file as u8));
                file += 1;
            }
            if file > 8 {
                return Err(FenError::RankWidth { rank: rank as usize + 1 });
            }
        }
        if file != 8 {
            return Err(FenError::RankWidth { rank: rank as usize + 1 });
        }
    }
    Ok(())
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    if field == "-" {
        return Ok(CastlingRights::NONE);
    }
    let mut rights = 0u8;
    for c in field.chars() {
        let bit = match c {
            'K' => CastlingRights::WHITE_KINGSIDE,
            'Q' => CastlingRights::WHITE_QUEENSIDE,
            'k' => CastlingRights::BLACK_KINGSIDE,
            'q' => CastlingRights::BLACK_QUEENSIDE,
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        };
        rights |= bit;
    }
    Ok(CastlingRights(rights))
}

/// The target must sit on the rank a double push of the opponent passes over
fn parse_en_passant(field: &str, side_to_move: Color) -> Result<Option<u8>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let invalid = || FenError::InvalidEnPassant(field.to_string());
    let target = sq_from_algebraic(field).ok_or_else(invalid)?;
    let expected_rank = match side_to_move {
        Color::White => 5,
        Color::Black => 2,
    };
    if sq_rank(target) != expected_rank {
        return Err(invalid());
    }
    Ok(Some(target))
}

fn parse_counter(field: &'static str, value: &str) -> Result<u32, FenError> {
    value.parse().map_err(|_| FenError::InvalidCounter {
        field,
        value: value.to_string(),
    })
}
