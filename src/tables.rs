//! Process-wide precomputed tables.
//!
//! Everything move generation reads (leaper tables, magic slider tables, Zobrist keys)
//! lives in one immutable [`Tables`] value. It is built once by [`init`] during startup
//! and handed to the generator by reference; nothing is mutated after that, so the
//! tables can be shared between threads freely.

use std::time::Instant;

use log::info;
use once_cell::sync::OnceCell;

use crate::error::TableError;
use crate::leapers::LeaperTables;
use crate::magic::MagicTables;
use crate::zobrist::ZobristKeys;

pub struct Tables {
    pub leapers: LeaperTables,
    pub sliders: MagicTables,
    pub zobrist: ZobristKeys,
}

impl Tables {
    /// Build a fresh set of tables. Prefer [`init`], which builds them once per process.
    pub fn build() -> Result<Self, TableError> {
        let start = Instant::now();
        let tables = Tables {
            leapers: LeaperTables::new(),
            sliders: MagicTables::new()?,
            zobrist: ZobristKeys::new(),
        };
        info!(
            "attack tables built in {:.1}ms ({} slider entries)",
            start.elapsed().as_secs_f64() * 1000.0,
            tables.sliders.table_len()
        );
        Ok(tables)
    }
}

static TABLES: OnceCell<Tables> = OnceCell::new();

/// Build the process-wide tables on first call; later calls return the same tables.
///
/// A failure here is fatal for the caller: no position can be searched with
/// incomplete tables. A failed build is not cached, so the error repeats on retry.
pub fn init() -> Result<&'static Tables, TableError> {
    TABLES.get_or_try_init(Tables::build)
}
