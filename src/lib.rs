pub mod bitboard;
pub mod types;
pub mod error;
pub mod leapers;
pub mod magic;
pub mod zobrist;
pub mod tables;
pub mod movelist;
pub mod board;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod game;
