use std::io::{self, Write};

use log::debug;

use crate::bitboard::sq_from_algebraic;
use crate::board::Board;
use crate::error::{FenError, MoveError};
use crate::movegen::MoveGenerator;
use crate::movelist::MoveList;
use crate::perft::{self, PerftReport};
use crate::tables::Tables;
use crate::types::{Move, PieceType};

/// A position plus the moves applied to it from text, driven by the shared tables.
pub struct Game<'t> {
    gen: MoveGenerator<'t>,
    board: Board,
    moves: Vec<Move>,
}

impl<'t> Game<'t> {
    /// Game from the starting position
    pub fn new(tables: &'t Tables) -> Self {
        Self {
            gen: MoveGenerator::new(tables),
            board: Board::new(),
            moves: Vec::new(),
        }
    }

    /// Game from a FEN string or `startpos`
    pub fn from_fen(tables: &'t Tables, fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            gen: MoveGenerator::new(tables),
            board: Board::from_fen(fen)?,
            moves: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn generator(&self) -> &MoveGenerator<'t> {
        &self.gen
    }

    /// Moves applied through [`Game::make_move`], oldest first
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn hash(&self) -> u64 {
        self.board.hash(&self.gen.tables().zobrist)
    }

    pub fn legal_moves(&mut self) -> MoveList {
        self.gen.legal_moves(&mut self.board)
    }

    /// Is the side to move in check
    pub fn is_check(&self) -> bool {
        self.gen.in_check(&self.board)
    }

    /// Play a move given in long algebraic notation (`e2e4`, `e7e8q`).
    ///
    /// The game is left untouched when the text does not name a legal move.
    pub fn make_move(&mut self, text: &str) -> Result<Move, MoveError> {
        let wanted = parse_move_text(text)?;
        let mv = self
            .legal_moves()
            .iter()
            .find(|&mv| wanted.matches(mv))
            .ok_or_else(|| MoveError::Illegal(text.to_string()))?;

        self.board.make_move(mv);
        self.moves.push(mv);
        debug_assert_eq!(self.board.ply_depth(), self.moves.len());
        debug!("made {} ({}), now {}", mv, mv.to_human(), self.board.to_fen());
        Ok(mv)
    }

    /// Take back the last move played; `text` must name it.
    pub fn unmake_move(&mut self, text: &str) -> Result<Move, MoveError> {
        let wanted = parse_move_text(text)?;
        let last = *self.moves.last().ok_or(MoveError::NothingToUndo)?;
        if !wanted.matches(last) {
            return Err(MoveError::NotLastMove {
                requested: text.to_string(),
                last: last.to_string(),
            });
        }

        self.moves.pop();
        self.board.unmake_move(last);
        debug!("unmade {}, now {}", last, self.board.to_fen());
        Ok(last)
    }

    /// Leaf nodes `depth` plies below the current position
    pub fn perft(&mut self, depth: u32) -> u64 {
        let color = self.board.side_to_move();
        perft::perft(&self.gen, &mut self.board, color, depth)
    }

    pub fn perft_parallel(&self, depth: u32) -> u64 {
        perft::perft_parallel(&self.gen, &self.board, depth)
    }

    /// Write the per-root-move divide to `out` and return it
    pub fn perft_detail<W: Write>(&mut self, depth: u32, out: &mut W) -> io::Result<PerftReport> {
        let report = perft::perft_detail(&self.gen, &mut self.board, depth);
        writeln!(out, "{}", report)?;
        Ok(report)
    }
}

/// Squares and promotion piece named by a move text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MoveText {
    from: u8,
    to: u8,
    promotion: Option<PieceType>,
}

impl MoveText {
    fn matches(&self, mv: Move) -> bool {
        mv.from() == self.from && mv.to() == self.to && mv.promotion() == self.promotion
    }
}

fn parse_move_text(text: &str) -> Result<MoveText, MoveError> {
    let syntax = || MoveError::Syntax(text.to_string());
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(syntax());
    }

    let from = sq_from_algebraic(&text[0..2]).ok_or_else(syntax)?;
    let to = sq_from_algebraic(&text[2..4]).ok_or_else(syntax)?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c @ ('q' | 'r' | 'b' | 'n')) => PieceType::from_char(c),
        Some(_) => return Err(syntax()),
    };

    Ok(MoveText { from, to, promotion })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_POSITION_FEN;
    use crate::tables;
    use pretty_assertions::assert_eq;

    fn game() -> Game<'static> {
        Game::new(tables::init().unwrap())
    }

    #[test]
    fn test_parse_move_text() {
        assert_eq!(
            parse_move_text("e7e8q"),
            Ok(MoveText {
                from: 52,
                to: 60,
                promotion: Some(PieceType::Queen)
            })
        );
        assert_eq!(parse_move_text("e2e4").map(|m| m.promotion), Ok(None));
        for bad in ["", "e2", "e2e9", "i2e4", "e7e8k", "e2e4qq", "é2e4"] {
            assert_eq!(parse_move_text(bad), Err(MoveError::Syntax(bad.to_string())), "{bad}");
        }
    }

    #[test]
    fn test_make_and_unmake_text_moves() {
        let mut game = game();
        let start_hash = game.hash();
        game.make_move("e2e4").unwrap();
        game.make_move("e7e5").unwrap();
        game.make_move("g1f3").unwrap();
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert_eq!(game.moves().len(), 3);

        assert_eq!(
            game.unmake_move("e7e5"),
            Err(MoveError::NotLastMove {
                requested: "e7e5".to_string(),
                last: "g1f3".to_string()
            })
        );
        game.unmake_move("g1f3").unwrap();
        game.unmake_move("e7e5").unwrap();
        game.unmake_move("e2e4").unwrap();
        assert_eq!(game.fen(), STARTING_POSITION_FEN);
        assert_eq!(game.hash(), start_hash);
        assert_eq!(game.unmake_move("e2e4"), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn test_illegal_move_leaves_game_untouched() {
        let mut game = game();
        assert_eq!(game.make_move("e2e5"), Err(MoveError::Illegal("e2e5".to_string())));
        assert_eq!(game.make_move("e2"), Err(MoveError::Syntax("e2".to_string())));
        assert_eq!(game.fen(), STARTING_POSITION_FEN);
        assert!(game.moves().is_empty());
    }

    #[test]
    fn test_promotion_needs_piece() {
        let tables = tables::init().unwrap();
        let mut game = Game::from_fen(tables, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(game.make_move("e7e8").is_err());
        let mv = game.make_move("e7e8n").unwrap();
        assert_eq!(mv.promotion(), Some(PieceType::Knight));
        assert_eq!(game.fen(), "4N3/8/8/8/8/8/k7/4K3 b - - 0 1");
    }

    #[test]
    fn test_is_check() {
        let tables = tables::init().unwrap();
        let mut game = Game::from_fen(tables, "startpos").unwrap();
        assert!(!game.is_check());
        for mv in ["e2e4", "f7f6", "d2d4", "g7g5", "d1h5"] {
            game.make_move(mv).unwrap();
        }
        assert!(game.is_check());
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_game_perft_and_detail() {
        let mut game = game();
        assert_eq!(game.perft(2), 400);
        assert_eq!(game.perft_parallel(2), 400);

        let mut out = Vec::new();
        let report = game.perft_detail(2, &mut out).unwrap();
        assert_eq!(report.total, 400);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("e2e4 20\n"));
        assert!(text.ends_with("\n\n400\n"));
    }
}
