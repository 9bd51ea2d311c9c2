//! Magic bitboard tables for the sliding pieces.
//!
//! For each square we take the "relevant occupancy" mask (the squares on the piece's
//! rays that could block it, board edges excluded), enumerate all of its subsets and
//! store the true blocked-ray attack set of every subset at
//! `offset + ((occupancy & mask) * magic) >> shift`. Magic numbers are discovered once
//! at startup by seeded random trial; each one is accepted only if it maps every subset
//! of its mask without a destructive collision. Queen attacks are the union of the two.

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::bitboard::{sq_to_algebraic, Bitboard, Square};
use crate::error::TableError;

/// Fixed seed so table construction is reproducible run to run.
pub const MAGIC_SEED: u64 = 0x5EED_B17B_0A4D_0001;

/// Upper bound on candidates tried for a single square before giving up.
const MAX_ATTEMPTS: u32 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Bishop,
    Rook,
}

impl Slider {
    const fn directions(self) -> [(i32, i32); 4] {
        match self {
            Slider::Bishop => [(1, 1), (1, -1), (-1, 1), (-1, -1)],
            Slider::Rook => [(1, 0), (-1, 0), (0, 1), (0, -1)],
        }
    }

    /// Relevant occupancy mask: the rays from `sq`, excluding the last square of each ray
    pub fn mask(self, sq: Square) -> Bitboard {
        let rank = (sq >> 3) as i32;
        let file = (sq & 7) as i32;
        let mut mask = 0u64;

        for (dr, df) in self.directions() {
            let mut r = rank + dr;
            let mut f = file + df;
            // a square only matters as a blocker if there is another square behind it
            while (0..8).contains(&(r + dr)) && (0..8).contains(&(f + df)) {
                mask |= 1u64 << (r * 8 + f);
                r += dr;
                f += df;
            }
        }
        mask
    }

    /// Attacks computed by walking each ray until the edge or the first occupied square
    pub fn attacks_slow(self, sq: Square, occupied: Bitboard) -> Bitboard {
        let rank = (sq >> 3) as i32;
        let file = (sq & 7) as i32;
        let mut attacks = 0u64;

        for (dr, df) in self.directions() {
            let mut r = rank + dr;
            let mut f = file + df;
            while (0..8).contains(&r) && (0..8).contains(&f) {
                let target = 1u64 << (r * 8 + f);
                attacks |= target;
                if occupied & target != 0 {
                    break;
                }
                r += dr;
                f += df;
            }
        }
        attacks
    }
}

/// Generate all subsets of a mask using the Carry-Rippler technique
pub fn all_subsets(mask: Bitboard) -> impl Iterator<Item = Bitboard> {
    let mut subset = 0u64;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let current = subset;
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            done = true;
        }
        Some(current)
    })
}

/// Hashing parameters for one square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Magic {
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
    /// Start of this square's slice in the shared attack table
    pub offset: usize,
}

impl Magic {
    #[inline(always)]
    pub fn index(&self, occupied: Bitboard) -> usize {
        self.offset + ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Slider attack lookup tables, immutable once built
pub struct MagicTables {
    bishop: [Magic; 64],
    rook: [Magic; 64],
    /// Attack sets of every square of both sliders, packed back to back
    attacks: Vec<Bitboard>,
}

impl MagicTables {
    /// Build both sliders' tables, searching magics with the default seed
    pub fn new() -> Result<Self, TableError> {
        Self::with_seed(MAGIC_SEED)
    }

    pub fn with_seed(seed: u64) -> Result<Self, TableError> {
        Self::search(seed, MAX_ATTEMPTS)
    }

    /// Build both tables, giving up on a square after `max_attempts` candidates
    pub fn search(seed: u64, max_attempts: u32) -> Result<Self, TableError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut attacks = Vec::with_capacity(5_248 + 102_400);
        let mut bishop = [Magic::default(); 64];
        let mut rook = [Magic::default(); 64];

        for (slider, magics) in [(Slider::Bishop, &mut bishop), (Slider::Rook, &mut rook)] {
            for sq in 0..64u8 {
                let (mut magic, table) = find_magic(slider, sq, &mut rng, max_attempts)?;
                magic.offset = attacks.len();
                attacks.extend_from_slice(&table);
                magics[sq as usize] = magic;
            }
        }

        Ok(MagicTables { bishop, rook, attacks })
    }

    /// Get bishop attacks using magic lookup
    #[inline(always)]
    pub fn bishop_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.attacks[self.bishop[sq as usize].index(occupied)]
    }

    /// Get rook attacks using magic lookup
    #[inline(always)]
    pub fn rook_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.attacks[self.rook[sq as usize].index(occupied)]
    }

    /// Get queen attacks (combines bishop and rook)
    #[inline(always)]
    pub fn queen_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.bishop_attacks(sq, occupied) | self.rook_attacks(sq, occupied)
    }

    #[inline(always)]
    pub fn attacks(&self, slider: Slider, sq: Square, occupied: Bitboard) -> Bitboard {
        match slider {
            Slider::Bishop => self.bishop_attacks(sq, occupied),
            Slider::Rook => self.rook_attacks(sq, occupied),
        }
    }

    pub fn magic(&self, slider: Slider, sq: Square) -> &Magic {
        match slider {
            Slider::Bishop => &self.bishop[sq as usize],
            Slider::Rook => &self.rook[sq as usize],
        }
    }

    /// Number of attack sets stored across all squares
    pub fn table_len(&self) -> usize {
        self.attacks.len()
    }

    /// Check every subset of every mask against a ray walk.
    pub fn verify(&self) -> Result<(), TableError> {
        for slider in [Slider::Bishop, Slider::Rook] {
            for sq in 0..64u8 {
                let mask = self.magic(slider, sq).mask;
                for occupied in all_subsets(mask) {
                    if self.attacks(slider, sq, occupied) != slider.attacks_slow(sq, occupied) {
                        return Err(TableError::WrongAttacks { slider, square: sq, occupied });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Try sparse random candidates until one hashes every subset of the mask collision-free.
fn find_magic(
    slider: Slider,
    sq: Square,
    rng: &mut StdRng,
    max_attempts: u32,
) -> Result<(Magic, Vec<Bitboard>), TableError> {
    let mask = slider.mask(sq);
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;

    let occupancies: Vec<Bitboard> = all_subsets(mask).collect();
    let reference: Vec<Bitboard> = occupancies
        .iter()
        .map(|&occ| slider.attacks_slow(sq, occ))
        .collect();

    let mut table = vec![0u64; size];
    // slot was written during attempt `used[i]`; avoids clearing the table every attempt
    let mut used = vec![0u32; size];

    for attempt in 1..=max_attempts {
        let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        let mut ok = true;
        for (&occ, &attacks) in occupancies.iter().zip(&reference) {
            let idx = (occ.wrapping_mul(magic) >> shift) as usize;
            if used[idx] != attempt {
                used[idx] = attempt;
                table[idx] = attacks;
            } else if table[idx] != attacks {
                ok = false;
                break;
            }
        }

        if ok {
            debug!(
                "{slider:?} magic for {} found after {attempt} attempts",
                sq_to_algebraic(sq)
            );
            let magic = Magic { mask, magic, shift, offset: 0 };
            return Ok((magic, table));
        }
    }

    Err(TableError::MagicNotFound {
        slider,
        square: sq,
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::{make_sq, sq, sq_to_bb};
    use once_cell::sync::Lazy;

    static TABLES: Lazy<MagicTables> =
        Lazy::new(|| MagicTables::new().expect("magic search failed"));

    #[test]
    fn test_search_gives_up_after_budget() {
        let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
        assert_eq!(
            find_magic(Slider::Rook, sq::A1, &mut rng, 0).map(|(magic, _)| magic.magic),
            Err(TableError::MagicNotFound {
                slider: Slider::Rook,
                square: sq::A1,
                attempts: 0
            })
        );

        let result = MagicTables::search(MAGIC_SEED, 1);
        assert!(
            matches!(result, Err(TableError::MagicNotFound { attempts: 1, .. })),
            "a single candidate per square should not be enough"
        );
    }

    #[test]
    fn test_mask_sizes() {
        assert_eq!(Slider::Rook.mask(sq::A1).count_ones(), 12);
        assert_eq!(Slider::Rook.mask(make_sq(3, 4)).count_ones(), 10);
        assert_eq!(Slider::Bishop.mask(sq::A1).count_ones(), 6);
        assert_eq!(Slider::Bishop.mask(make_sq(3, 3)).count_ones(), 9);
        // edges never count as blockers
        assert_eq!(Slider::Rook.mask(sq::A1) & sq_to_bb(sq::H1), 0);
        assert_eq!(Slider::Rook.mask(sq::A1) & sq_to_bb(sq::A8), 0);
    }

    #[test]
    fn test_all_subsets_count() {
        let mask = Slider::Bishop.mask(make_sq(3, 3));
        let subsets: Vec<_> = all_subsets(mask).collect();
        assert_eq!(subsets.len(), 1 << 9);
        assert!(subsets.iter().all(|s| s & !mask == 0));
        assert_eq!(all_subsets(0).count(), 1);
    }

    #[test]
    fn test_rook_attacks_empty_board() {
        // Rook on e4 should attack 14 squares (7 on rank, 7 on file)
        assert_eq!(TABLES.rook_attacks(make_sq(3, 4), 0).count_ones(), 14);
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        // Rook on e4, with pieces on e2 and g4
        let sq = make_sq(3, 4);
        let e2 = sq_to_bb(make_sq(1, 4));
        let g4 = sq_to_bb(make_sq(3, 6));
        let attacks = TABLES.rook_attacks(sq, e2 | g4);

        assert!(attacks & e2 != 0);
        assert!(attacks & g4 != 0);
        assert!(attacks & sq_to_bb(sq::E1) == 0); // blocked
        assert!(attacks & sq_to_bb(make_sq(3, 7)) == 0); // h4, blocked
    }

    #[test]
    fn test_bishop_attacks_with_blockers() {
        // Bishop on e4, with pieces on c2 and g6
        let sq = make_sq(3, 4);
        let c2 = sq_to_bb(make_sq(1, 2));
        let g6 = sq_to_bb(make_sq(5, 6));
        let attacks = TABLES.bishop_attacks(sq, c2 | g6);

        assert!(attacks & c2 != 0);
        assert!(attacks & g6 != 0);
        assert!(attacks & sq_to_bb(sq::B1) == 0);
        assert!(attacks & sq_to_bb(make_sq(6, 7)) == 0); // h7
        assert_eq!(TABLES.bishop_attacks(sq, 0).count_ones(), 13);
    }

    #[test]
    fn test_queen_attacks() {
        assert_eq!(TABLES.queen_attacks(make_sq(3, 4), 0).count_ones(), 27);
    }

    #[test]
    fn test_irrelevant_occupancy_is_ignored() {
        let sq = make_sq(3, 4);
        let noise = sq_to_bb(sq::A1) | sq_to_bb(sq::H8) | sq_to_bb(make_sq(0, 4));
        assert_eq!(TABLES.bishop_attacks(sq, noise), TABLES.bishop_attacks(sq, 0));
        assert_eq!(TABLES.rook_attacks(sq, sq_to_bb(sq::A1)), TABLES.rook_attacks(sq, 0));
    }

    #[test]
    fn test_table_matches_ray_walk_everywhere() {
        TABLES.verify().unwrap();
        assert_eq!(TABLES.table_len(), 5_248 + 102_400);
    }
}
