use std::fmt;

use crate::bitboard::{sq_to_algebraic, Square};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    pub fn from_case(c: char) -> Color {
        if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline(always)]
    pub const fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn to_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of `index`; anything past the king maps to `None`.
    #[inline(always)]
    pub const fn from_index(idx: u32) -> Option<PieceType> {
        match idx {
            0 => Some(PieceType::Pawn),
            1 => Some(PieceType::Knight),
            2 => Some(PieceType::Bishop),
            3 => Some(PieceType::Rook),
            4 => Some(PieceType::Queen),
            5 => Some(PieceType::King),
            _ => None,
        }
    }

    /// Case-insensitive piece letter as used by FEN.
    pub fn from_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Upper-case letter of the piece
    pub fn to_char(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// FEN letter of the piece for the given color
    pub fn to_fen_char(self, color: Color) -> char {
        match color {
            Color::White => self.to_char(),
            Color::Black => self.to_char().to_ascii_lowercase(),
        }
    }

    pub fn to_human(self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }
}

pub const PIECES_CAN_PROMOTE_TO: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// Castling availability, one bit per (color, side).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;

    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline(always)]
    pub const fn kingside_bit(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline(always)]
    pub const fn queenside_bit(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    #[inline(always)]
    pub const fn kingside(self, color: Color) -> bool {
        self.0 & Self::kingside_bit(color) != 0
    }

    #[inline(always)]
    pub const fn queenside(self, color: Color) -> bool {
        self.0 & Self::queenside_bit(color) != 0
    }

    /// Keep only the rights present in `mask`. Rights are never added back this way.
    #[inline(always)]
    pub fn restrict(&mut self, mask: u8) {
        self.0 &= mask;
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("-");
        }
        for (bit, c) in [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.0 & bit != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// A single ply packed into 32 bits.
///
/// Layout (low to high):
/// - bits 0-5: origin square
/// - bits 6-11: destination square
/// - bits 12-14: moved piece
/// - bits 15-17: captured piece (7 = none)
/// - bits 18-20: promotion piece (7 = none)
/// - bit 21: castle, bit 22: en passant, bit 23: double pawn push
///
/// A move only has meaning for the position it was generated from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    const SQ_MASK: u32 = 0x3F;
    const PIECE_MASK: u32 = 0x7;
    const NO_PIECE: u32 = 0x7;

    const TO_SHIFT: u32 = 6;
    const PIECE_SHIFT: u32 = 12;
    const CAPTURED_SHIFT: u32 = 15;
    const PROMOTION_SHIFT: u32 = 18;

    const CASTLE: u32 = 1 << 21;
    const EN_PASSANT: u32 = 1 << 22;
    const DOUBLE_PUSH: u32 = 1 << 23;

    /// Placeholder used to fill unused move list slots.
    pub const NONE: Move = Move(
        (Self::NO_PIECE << Self::CAPTURED_SHIFT) | (Self::NO_PIECE << Self::PROMOTION_SHIFT),
    );

    #[inline(always)]
    pub const fn new(
        from: Square,
        to: Square,
        piece: PieceType,
        captured: Option<PieceType>,
    ) -> Self {
        let captured = match captured {
            Some(p) => p as u32,
            None => Self::NO_PIECE,
        };
        Move(
            (from as u32)
                | ((to as u32) << Self::TO_SHIFT)
                | ((piece as u32) << Self::PIECE_SHIFT)
                | (captured << Self::CAPTURED_SHIFT)
                | (Self::NO_PIECE << Self::PROMOTION_SHIFT),
        )
    }

    #[inline(always)]
    pub const fn new_quiet(from: Square, to: Square, piece: PieceType) -> Self {
        Self::new(from, to, piece, None)
    }

    #[inline(always)]
    pub const fn new_promotion(
        from: Square,
        to: Square,
        captured: Option<PieceType>,
        promotion: PieceType,
    ) -> Self {
        let base = Self::new(from, to, PieceType::Pawn, captured).0;
        let cleared = base & !(Self::PIECE_MASK << Self::PROMOTION_SHIFT);
        Move(cleared | ((promotion as u32) << Self::PROMOTION_SHIFT))
    }

    #[inline(always)]
    pub const fn new_en_passant(from: Square, to: Square) -> Self {
        Move(Self::new(from, to, PieceType::Pawn, Some(PieceType::Pawn)).0 | Self::EN_PASSANT)
    }

    #[inline(always)]
    pub const fn new_double_push(from: Square, to: Square) -> Self {
        Move(Self::new_quiet(from, to, PieceType::Pawn).0 | Self::DOUBLE_PUSH)
    }

    #[inline(always)]
    pub const fn new_castle(from: Square, to: Square) -> Self {
        Move(Self::new_quiet(from, to, PieceType::King).0 | Self::CASTLE)
    }

    #[inline(always)]
    pub const fn from(self) -> Square {
        (self.0 & Self::SQ_MASK) as Square
    }

    #[inline(always)]
    pub const fn to(self) -> Square {
        ((self.0 >> Self::TO_SHIFT) & Self::SQ_MASK) as Square
    }

    #[inline(always)]
    pub fn piece(self) -> PieceType {
        // every constructor stores a real piece here
        PieceType::from_index((self.0 >> Self::PIECE_SHIFT) & Self::PIECE_MASK)
            .unwrap_or(PieceType::Pawn)
    }

    #[inline(always)]
    pub const fn captured(self) -> Option<PieceType> {
        PieceType::from_index((self.0 >> Self::CAPTURED_SHIFT) & Self::PIECE_MASK)
    }

    #[inline(always)]
    pub const fn promotion(self) -> Option<PieceType> {
        PieceType::from_index((self.0 >> Self::PROMOTION_SHIFT) & Self::PIECE_MASK)
    }

    #[inline(always)]
    pub const fn is_capture(self) -> bool {
        self.captured().is_some()
    }

    #[inline(always)]
    pub const fn is_castle(self) -> bool {
        self.0 & Self::CASTLE != 0
    }

    #[inline(always)]
    pub const fn is_en_passant(self) -> bool {
        self.0 & Self::EN_PASSANT != 0
    }

    #[inline(always)]
    pub const fn is_double_push(self) -> bool {
        self.0 & Self::DOUBLE_PUSH != 0
    }

    /// Long algebraic form: origin, destination and an optional lower-case promotion letter.
    pub fn to_long_algebraic(self) -> String {
        let mut s = String::with_capacity(5);
        s.push_str(&sq_to_algebraic(self.from()));
        s.push_str(&sq_to_algebraic(self.to()));
        if let Some(promo) = self.promotion() {
            s.push(promo.to_char().to_ascii_lowercase());
        }
        s
    }

    pub fn to_human(self) -> String {
        if self.is_castle() {
            let side = if self.to() > self.from() { "kingside" } else { "queenside" };
            return format!("king castles {side}");
        }
        let mut s = format!(
            "{} from {} to {}",
            self.piece().to_human(),
            sq_to_algebraic(self.from()),
            sq_to_algebraic(self.to())
        );
        if let Some(captured) = self.captured() {
            s.push_str(&format!(" capturing {}", captured.to_human()));
            if self.is_en_passant() {
                s.push_str(" en passant");
            }
        }
        if let Some(promo) = self.promotion() {
            s.push_str(&format!(" promoting to {}", promo.to_human()));
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_long_algebraic())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_long_algebraic())
    }
}
