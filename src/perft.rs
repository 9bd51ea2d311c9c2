//! Perft: count the leaf nodes of the legal move tree to a fixed depth.
//!
//! Used to validate move generation against published node counts, see
//! https://www.chessprogramming.org/Perft_Results

use std::fmt;

use log::trace;
use rayon::prelude::*;

use crate::board::Board;
use crate::error::FenError;
use crate::movegen::MoveGenerator;
use crate::movelist::MoveList;
use crate::types::{Color, Move};

/// Leaf count of the legal move tree below `board`, with `color` to move.
///
/// Bulk counts at the last ply: a depth of 1 (or 0) returns the number of legal
/// moves without making them.
pub fn perft(gen: &MoveGenerator, board: &mut Board, color: Color, depth: u32) -> u64 {
    let mut list = MoveList::new();
    let count = gen.generate_moves(color, board, &mut list) as u64;
    if depth <= 1 {
        return count;
    }

    let mut nodes = 0;
    for mv in &list {
        let mut child = board.apply(mv);
        nodes += perft(gen, &mut child, color.other(), depth - 1);
    }
    nodes
}

/// Same tree walk as [`perft`] but makes every move down to depth 0.
///
/// Much slower; the reference the bulk-counting version is checked against.
pub fn perft_naive(gen: &MoveGenerator, board: &mut Board, color: Color, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    gen.generate_moves(color, board, &mut list);

    let mut nodes = 0;
    for mv in &list {
        let mut child = board.apply(mv);
        nodes += perft_naive(gen, &mut child, color.other(), depth - 1);
    }
    nodes
}

/// Node count below each root move ("divide")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerftReport {
    pub entries: Vec<(Move, u64)>,
    pub total: u64,
}

impl fmt::Display for PerftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (mv, nodes) in &self.entries {
            writeln!(f, "{} {}", mv, nodes)?;
        }
        write!(f, "\n{}", self.total)
    }
}

/// Divide the side to move's tree by root move. At depth 1 each move counts 1.
pub fn perft_detail(gen: &MoveGenerator, board: &mut Board, depth: u32) -> PerftReport {
    let color = board.side_to_move();
    let moves = gen.legal_moves(board);

    let entries: Vec<(Move, u64)> = moves
        .iter()
        .map(|mv| {
            let nodes = if depth <= 1 {
                1
            } else {
                let mut child = board.apply(mv);
                perft(gen, &mut child, color.other(), depth - 1)
            };
            trace!("perft {} {}: {}", depth, mv, nodes);
            (mv, nodes)
        })
        .collect();

    let total = entries.iter().map(|(_, nodes)| nodes).sum();
    PerftReport { entries, total }
}

/// [`perft`] with the root moves split across the rayon thread pool.
///
/// Each root move gets its own copy of the board; below the root the walk is the
/// ordinary single-threaded one.
pub fn perft_parallel(gen: &MoveGenerator, board: &Board, depth: u32) -> u64 {
    let color = board.side_to_move();
    let mut root = board.clone();
    let moves = gen.legal_moves(&mut root);
    if depth <= 1 {
        return moves.len() as u64;
    }

    moves
        .as_slice()
        .par_iter()
        .map(|&mv| {
            let mut child = board.clone();
            child.make_move(mv);
            perft(gen, &mut child, color.other(), depth - 1)
        })
        .sum()
}

/// A reference position with its published node counts
#[derive(Debug, Clone, Copy)]
pub struct PerftCase {
    pub name: &'static str,
    pub fen: &'static str,
    /// `expected[i]` is the node count at depth `i + 1`
    pub expected: &'static [u64],
}

impl PerftCase {
    pub fn depths(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.expected
            .iter()
            .enumerate()
            .map(|(i, &nodes)| (i as u32 + 1, nodes))
    }

    pub fn board(&self) -> Result<Board, FenError> {
        Board::from_fen(self.fen)
    }
}

/// Positions from https://www.chessprogramming.org/Perft_Results
pub const SUITE: &[PerftCase] = &[
    PerftCase {
        name: "start",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        expected: &[20, 400, 8_902, 197_281, 4_865_609],
    },
    PerftCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected: &[48, 2_039, 97_862, 4_085_603],
    },
    PerftCase {
        name: "position 3",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected: &[14, 191, 2_812, 43_238, 674_624],
    },
    PerftCase {
        name: "position 4",
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        expected: &[6, 264, 9_467, 422_333],
    },
    PerftCase {
        name: "position 5",
        fen: "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        expected: &[44, 1_486, 62_379, 2_103_487],
    },
    PerftCase {
        name: "position 6",
        fen: "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        expected: &[46, 2_079, 89_890, 3_894_594],
    },
];

/// Outcome of one (position, depth) pair of the suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteResult {
    pub name: &'static str,
    pub depth: u32,
    pub expected: u64,
    pub actual: u64,
}

impl SuiteResult {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

impl fmt::Display for SuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "passed: {:<12} depth {} {}", self.name, self.depth, self.actual)
        } else {
            write!(
                f,
                "failed: {:<12} depth {} expected {} got {}",
                self.name, self.depth, self.expected, self.actual
            )
        }
    }
}

/// Run every suite entry whose expected count is at most `max_nodes`.
pub fn run_suite(gen: &MoveGenerator, max_nodes: u64) -> Result<Vec<SuiteResult>, FenError> {
    let mut results = Vec::new();
    for case in SUITE {
        let mut board = case.board()?;
        let color = board.side_to_move();
        for (depth, expected) in case.depths().filter(|&(_, nodes)| nodes <= max_nodes) {
            let actual = perft(gen, &mut board, color, depth);
            results.push(SuiteResult {
                name: case.name,
                depth,
                expected,
                actual,
            });
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables;
    use pretty_assertions::assert_eq;

    fn generator() -> MoveGenerator<'static> {
        MoveGenerator::new(tables::init().unwrap())
    }

    #[test]
    fn test_perft_start_shallow() {
        let gen = generator();
        let mut board = Board::new();
        let before = board.clone();
        for (depth, expected) in [(1, 20), (2, 400), (3, 8_902)] {
            assert_eq!(perft(&gen, &mut board, Color::White, depth), expected);
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_depth_one_is_move_count() {
        let gen = generator();
        for case in SUITE {
            let mut board = case.board().unwrap();
            let color = board.side_to_move();
            let count = gen.legal_moves(&mut board).len() as u64;
            assert_eq!(perft(&gen, &mut board, color, 1), count, "{}", case.name);
            assert_eq!(count, case.expected[0], "{}", case.name);
        }
    }

    #[test]
    fn test_bulk_counting_matches_naive() {
        let gen = generator();
        for case in SUITE {
            let mut board = case.board().unwrap();
            let color = board.side_to_move();
            assert_eq!(
                perft(&gen, &mut board, color, 2),
                perft_naive(&gen, &mut board, color, 2),
                "{}",
                case.name
            );
        }
    }

    #[test]
    fn test_no_moves_gives_zero() {
        let gen = generator();
        for fen in [
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1",
        ] {
            let mut board = Board::from_fen(fen).unwrap();
            let color = board.side_to_move();
            for depth in 1..=3 {
                assert_eq!(perft(&gen, &mut board, color, depth), 0, "{fen}");
            }
        }
    }

    #[test]
    fn test_perft_detail() {
        let gen = generator();
        let mut board = Board::new();

        let shallow = perft_detail(&gen, &mut board, 1);
        assert_eq!(shallow.entries.len(), 20);
        assert!(shallow.entries.iter().all(|&(_, nodes)| nodes == 1));
        assert_eq!(shallow.total, 20);

        let report = perft_detail(&gen, &mut board, 3);
        assert_eq!(report.total, 8_902);
        let e2e4 = report
            .entries
            .iter()
            .find(|(mv, _)| mv.to_long_algebraic() == "e2e4")
            .unwrap();
        assert_eq!(e2e4.1, 600);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_perft_report_format() {
        let gen = generator();
        let mut board = Board::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let report = perft_detail(&gen, &mut board, 1);
        assert_eq!(report.to_string(), "a1b1 1\na1a2 1\na1b2 1\n\n3");
    }

    #[test]
    fn test_parallel_matches_serial() {
        let gen = generator();
        let case = &SUITE[1];
        let mut board = case.board().unwrap();
        let serial = perft(&gen, &mut board, Color::White, 3);
        assert_eq!(perft_parallel(&gen, &board, 3), serial);
        assert_eq!(perft_parallel(&gen, &board, 1), case.expected[0]);
    }

    #[test]
    fn test_suite_result_display() {
        let result = SuiteResult {
            name: "start",
            depth: 2,
            expected: 400,
            actual: 399,
        };
        assert!(!result.passed());
        assert!(result.to_string().starts_with("failed:"));
    }
}
