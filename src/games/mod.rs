//! Reference games the engine plays out of the box.
//!
//! They double as executable documentation of the [`crate::game::Game`]
//! contract: incremental Zobrist keys, stack-ordered undo and the
//! single-agent mode.

pub mod breakthrough;
pub mod bridge;
pub mod tictactoe;
