//! Move generation.
//!
//! Three entry points, all driven by the precomputed [`Tables`]:
//! - [`MoveGenerator::pseudolegal_moves`] produces every move consistent with piece
//!   movement rules, ignoring whether the mover's king is left in check;
//! - [`MoveGenerator::generate_moves`] filters those by making each move, rebuilding
//!   the enemy attack map and dropping the move if the mover's king is attacked;
//! - [`MoveGenerator::generate_attacks`] returns every square a color attacks.

use crate::bitboard::*;
use crate::board::{en_passant_victim, Board};
use crate::leapers::{king_attack_mask, knight_attack_mask, pawn_attack_mask};
use crate::movelist::MoveList;
use crate::tables::Tables;
use crate::types::{CastlingRights, Color, Move, PieceType, PIECES_CAN_PROMOTE_TO};

#[derive(Clone, Copy)]
pub struct MoveGenerator<'t> {
    tables: &'t Tables,
}

impl<'t> MoveGenerator<'t> {
    pub fn new(tables: &'t Tables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'t Tables {
        self.tables
    }

    /// Union of every square attacked by `color`'s pieces
    pub fn generate_attacks(&self, color: Color, board: &Board) -> Bitboard {
        let occupied = board.occupied();
        let sliders = &self.tables.sliders;
        let queens = board.pieces(color, PieceType::Queen);

        let mut attacks = pawn_attack_mask(color, board.pieces(color, PieceType::Pawn));
        attacks |= knight_attack_mask(board.pieces(color, PieceType::Knight));
        attacks |= king_attack_mask(board.pieces(color, PieceType::King));

        for from_sq in BitboardIter(board.pieces(color, PieceType::Bishop) | queens) {
            attacks |= sliders.bishop_attacks(from_sq, occupied);
        }
        for from_sq in BitboardIter(board.pieces(color, PieceType::Rook) | queens) {
            attacks |= sliders.rook_attacks(from_sq, occupied);
        }
        attacks
    }

    /// Fill `list` with `color`'s pseudo-legal moves and return how many there are.
    ///
    /// A side without a king gets no moves at all.
    pub fn pseudolegal_moves(&self, color: Color, board: &Board, list: &mut MoveList) -> usize {
        list.clear();

        if board.pieces(color, PieceType::King) == 0 {
            return 0;
        }

        let enemy_attacks = self.generate_attacks(color.other(), board);

        self.generate_pawn_moves(color, board, list);
        self.generate_knight_moves(color, board, list);
        self.generate_king_moves(color, board, enemy_attacks, list);

        self.generate_slider_moves(color, board, PieceType::Bishop, list);
        self.generate_slider_moves(color, board, PieceType::Rook, list);
        self.generate_slider_moves(color, board, PieceType::Queen, list);

        list.len()
    }

    /// Fill `list` with `color`'s legal moves and return how many there are.
    ///
    /// The board is used as scratch space and is back in its original state when
    /// this returns, whichever side `color` is.
    pub fn generate_moves(&self, color: Color, board: &mut Board, list: &mut MoveList) -> usize {
        if self.pseudolegal_moves(color, board, list) == 0 {
            return 0;
        }

        let enemy = color.other();
        list.retain(|mv| {
            let child = board.apply(mv);
            let enemy_attacks = self.generate_attacks(enemy, &child);
            !child.is_check(color, enemy_attacks)
        });

        list.len()
    }

    /// Legal moves of the side to move
    pub fn legal_moves(&self, board: &mut Board) -> MoveList {
        let mut list = MoveList::new();
        self.generate_moves(board.side_to_move(), board, &mut list);
        list
    }

    /// Is the side to move in check
    pub fn in_check(&self, board: &Board) -> bool {
        let color = board.side_to_move();
        board.is_check(color, self.generate_attacks(color.other(), board))
    }

    fn generate_pawn_moves(&self, color: Color, board: &Board, list: &mut MoveList) {
        let enemy_color = color.other();
        let pawns = board.pieces(color, PieceType::Pawn);
        let enemy = board.occupancy(enemy_color);
        let empty = !board.occupied();
        let (start_rank, promotion_rank) = match color {
            Color::White => (RANK_2, RANK_8),
            Color::Black => (RANK_7, RANK_1),
        };

        // only offer en passant when the pawn that double-pushed is really there
        let en_passant = board.en_passant().filter(|&target| {
            contains(empty, target)
                && contains(board.pieces(enemy_color, PieceType::Pawn), en_passant_victim(target))
        });

        for from_sq in BitboardIter(pawns) {
            let attacks = self.tables.leapers.pawn_attacks(color, from_sq);

            for to_sq in BitboardIter(attacks & enemy) {
                let captured = board.piece_type_at(enemy_color, to_sq);
                push_pawn_move(list, from_sq, to_sq, captured, promotion_rank);
            }

            if let Some(target) = en_passant {
                if contains(attacks, target) {
                    list.push(Move::new_en_passant(from_sq, target));
                }
            }

            let one_step = forward(color, sq_to_bb(from_sq)) & empty;
            if one_step == 0 {
                continue;
            }
            push_pawn_move(list, from_sq, lsb(one_step), None, promotion_rank);

            if contains(start_rank, from_sq) {
                let two_step = forward(color, one_step) & empty;
                if two_step != 0 {
                    list.push(Move::new_double_push(from_sq, lsb(two_step)));
                }
            }
        }
    }

    fn generate_knight_moves(&self, color: Color, board: &Board, list: &mut MoveList) {
        let friendly = board.occupancy(color);
        for from_sq in BitboardIter(board.pieces(color, PieceType::Knight)) {
            let targets = self.tables.leapers.knight_attacks(from_sq) & !friendly;
            push_targets(list, board, color, from_sq, targets, PieceType::Knight);
        }
    }

    /// King steps to unattacked squares, plus castling
    fn generate_king_moves(
        &self,
        color: Color,
        board: &Board,
        enemy_attacks: Bitboard,
        list: &mut MoveList,
    ) {
        let friendly = board.occupancy(color);
        let kings = board.pieces(color, PieceType::King);

        for from_sq in BitboardIter(kings) {
            let targets = self.tables.leapers.king_attacks(from_sq) & !friendly & !enemy_attacks;
            push_targets(list, board, color, from_sq, targets, PieceType::King);
        }

        // Can't castle while in check
        if kings & enemy_attacks != 0 {
            return;
        }
        self.generate_castling(color, board, enemy_attacks, list);
    }

    fn generate_castling(
        &self,
        color: Color,
        board: &Board,
        enemy_attacks: Bitboard,
        list: &mut MoveList,
    ) {
        let rights = board.castling();
        if rights.0 & (CastlingRights::kingside_bit(color) | CastlingRights::queenside_bit(color)) == 0 {
            return;
        }

        // squares of the back rank are the white ones shifted up for black
        let offset = match color {
            Color::White => 0,
            Color::Black => 56,
        };
        let king_home = sq::E1 + offset;
        if !contains(board.pieces(color, PieceType::King), king_home) {
            return;
        }
        let rooks = board.pieces(color, PieceType::Rook);
        let occupied = board.occupied();

        if rights.kingside(color) && contains(rooks, sq::H1 + offset) {
            let path = sq_to_bb(sq::F1 + offset) | sq_to_bb(sq::G1 + offset);
            if occupied & path == 0 && enemy_attacks & path == 0 {
                list.push(Move::new_castle(king_home, sq::G1 + offset));
            }
        }

        if rights.queenside(color) && contains(rooks, sq::A1 + offset) {
            let path = sq_to_bb(sq::C1 + offset) | sq_to_bb(sq::D1 + offset);
            let between = path | sq_to_bb(sq::B1 + offset);
            // b1 only needs to be empty, c1 and d1 must be unattacked
            if occupied & between == 0 && enemy_attacks & path == 0 {
                list.push(Move::new_castle(king_home, sq::C1 + offset));
            }
        }
    }

    fn generate_slider_moves(
        &self,
        color: Color,
        board: &Board,
        piece: PieceType,
        list: &mut MoveList,
    ) {
        let sliders = &self.tables.sliders;
        let friendly = board.occupancy(color);
        let occupied = board.occupied();

        for from_sq in BitboardIter(board.pieces(color, piece)) {
            let attacks = match piece {
                PieceType::Bishop => sliders.bishop_attacks(from_sq, occupied),
                PieceType::Rook => sliders.rook_attacks(from_sq, occupied),
                _ => sliders.queen_attacks(from_sq, occupied),
            };
            push_targets(list, board, color, from_sq, attacks & !friendly, piece);
        }
    }
}

/// One rank towards the opponent
#[inline(always)]
fn forward(color: Color, bb: Bitboard) -> Bitboard {
    match color {
        Color::White => north(bb),
        Color::Black => south(bb),
    }
}

#[inline]
fn push_targets(
    list: &mut MoveList,
    board: &Board,
    color: Color,
    from_sq: Square,
    targets: Bitboard,
    piece: PieceType,
) {
    for to_sq in BitboardIter(targets) {
        let captured = board.piece_type_at(color.other(), to_sq);
        list.push(Move::new(from_sq, to_sq, piece, captured));
    }
}

#[inline]
fn push_pawn_move(
    list: &mut MoveList,
    from_sq: Square,
    to_sq: Square,
    captured: Option<PieceType>,
    promotion_rank: Bitboard,
) {
    if contains(promotion_rank, to_sq) {
        for promo_type in PIECES_CAN_PROMOTE_TO {
            list.push(Move::new_promotion(from_sq, to_sq, captured, promo_type));
        }
    } else {
        list.push(Move::new(from_sq, to_sq, PieceType::Pawn, captured));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables;
    use pretty_assertions::assert_eq;

    fn generator() -> MoveGenerator<'static> {
        MoveGenerator::new(tables::init().unwrap())
    }

    fn legal_names(fen: &str) -> Vec<String> {
        let mut board = Board::from_fen(fen).unwrap();
        let list = generator().legal_moves(&mut board);
        let mut names: Vec<String> = list.iter().map(|m| m.to_long_algebraic()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_start_position_moves() {
        let mut board = Board::new();
        let before = board.clone();
        let list = generator().legal_moves(&mut board);
        assert_eq!(list.len(), 20);
        assert_eq!(board, before);
        assert_eq!(list.iter().filter(|m| m.is_double_push()).count(), 8);
    }

    #[test]
    fn test_start_position_attacks() {
        let board = Board::new();
        let gen = generator();
        // every square of ranks 2 and 3 plus b1..g1
        assert_eq!(gen.generate_attacks(Color::White, &board), 0xFF_FF7E);
        assert_eq!(
            gen.generate_attacks(Color::Black, &board),
            0x7EFF_FF00_0000_0000
        );
    }

    #[test]
    fn test_attacks_are_deterministic() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let gen = generator();
        for color in Color::ALL {
            assert_eq!(
                gen.generate_attacks(color, &board),
                gen.generate_attacks(color, &board.clone())
            );
        }
    }

    #[test]
    fn test_legal_never_exceeds_pseudolegal() {
        let gen = generator();
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ] {
            let mut board = Board::from_fen(fen).unwrap();
            let mut pseudo = MoveList::new();
            let mut legal = MoveList::new();
            let color = board.side_to_move();
            gen.pseudolegal_moves(color, &board, &mut pseudo);
            gen.generate_moves(color, &mut board, &mut legal);
            assert!(legal.len() <= pseudo.len(), "{fen}");
            assert!(legal.iter().all(|m| pseudo.contains(m)), "{fen}");
        }
    }

    #[test]
    fn test_legal_filter_keeps_pseudolegal_order() {
        let gen = generator();
        let mut board =
            Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
                .unwrap();
        let mut pseudo = MoveList::new();
        gen.pseudolegal_moves(Color::White, &board, &mut pseudo);
        let legal = gen.legal_moves(&mut board);
        let positions: Vec<usize> = legal
            .iter()
            .map(|m| pseudo.as_slice().iter().position(|p| *p == m).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(legal.len(), 6);
    }

    #[test]
    fn test_moves_for_side_not_to_move() {
        let gen = generator();
        let mut board = Board::new();
        let before = board.clone();

        let mut pseudo = MoveList::new();
        assert_eq!(gen.pseudolegal_moves(Color::Black, &board, &mut pseudo), 20);
        for mv in &pseudo {
            board.make_move(mv);
            assert!(board.is_consistent(), "{mv}");
            board.unmake_move(mv);
            assert_eq!(board, before, "{mv}");
        }

        let mut legal = MoveList::new();
        assert_eq!(gen.generate_moves(Color::Black, &mut board, &mut legal), 20);
        assert!(legal.iter().all(|m| sq_rank(m.from()) >= 6));
        assert_eq!(board, before);
    }

    #[test]
    fn test_no_king_means_no_moves() {
        let gen = generator();
        let mut board = Board::from_fen("8/8/8/8/8/8/PPPPPPPP/RNBQ1BNR w - - 0 1").unwrap();
        let mut list = MoveList::new();
        assert_eq!(gen.pseudolegal_moves(Color::White, &board, &mut list), 0);
        assert_eq!(gen.generate_moves(Color::White, &mut board, &mut list), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_checkmate_and_stalemate_have_no_moves() {
        // fool's mate
        assert!(legal_names("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").is_empty());
        assert!(legal_names("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").is_empty());
    }

    #[test]
    fn test_castling_through_attack() {
        let both = legal_names("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(both.contains(&"e1g1".to_string()));
        assert!(both.contains(&"e1c1".to_string()));

        // f1 is attacked by the rook on f8
        let queenside_only = legal_names("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        assert!(!queenside_only.contains(&"e1g1".to_string()));
        assert!(queenside_only.contains(&"e1c1".to_string()));

        // b1 attacked does not matter, the king never crosses it
        let b_file = legal_names("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(b_file.contains(&"e1c1".to_string()));

        // no castling out of check
        let in_check = legal_names("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!in_check.iter().any(|m| m == "e1g1" || m == "e1c1"));
    }

    #[test]
    fn test_en_passant_discovered_check_is_filtered() {
        let fen = "8/8/8/KPp4r/8/8/8/7k w - c6 0 1";
        let gen = generator();
        let board = Board::from_fen(fen).unwrap();
        let mut pseudo = MoveList::new();
        gen.pseudolegal_moves(Color::White, &board, &mut pseudo);
        assert!(pseudo.iter().any(|m| m.is_en_passant()));

        let legal = legal_names(fen);
        assert!(!legal.contains(&"b5c6".to_string()));
        assert!(legal.contains(&"b5b6".to_string()));
    }

    #[test]
    fn test_promotions() {
        let names = legal_names("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1");
        assert_eq!(names.len(), 24);
        for piece in ['q', 'r', 'b', 'n'] {
            assert!(names.contains(&format!("g2g1{piece}")));
            assert!(names.contains(&format!("g2h1{piece}")));
        }
    }

    #[test]
    fn test_generation_leaves_board_untouched() {
        let gen = generator();
        let mut board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let before = board.clone();
        let list = gen.legal_moves(&mut board);
        assert_eq!(list.len(), 48);
        assert_eq!(board, before);
    }
}
