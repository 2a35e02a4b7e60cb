//! Game-tree search engine for turn-based games: depth-bounded [negamax] with
//! alpha-beta pruning, iterative deepening under a wall-clock budget and a
//! clustered [transposition table] keyed by incremental [Zobrist hashing].
//!
//! The engine is generic over the game: anything implementing
//! [`game::Game`] and scored by an [`evaluation::Evaluator`] can be searched.
//! A few reference games live in [`games`].
//!
//! [negamax]: https://www.chessprogramming.org/Negamax
//! [transposition table]: https://www.chessprogramming.org/Transposition_Table
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing

// TODO: Gradually move most of warnings to deny.
#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod games;
pub mod search;
pub mod zobrist;

pub use config::Config;
pub use error::Error;
pub use search::Searcher;
use shadow_rs::shadow;

shadow!(build);

/// Returns the full engine version that can be used to identify how it was
/// built in the first place.
#[must_use]
pub fn engine_version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Logs the engine version and whether the build is clean on startup.
pub fn log_engine_info() {
    log::info!("plies {}", engine_version());
    log::info!("release build: {}", !shadow_rs::is_debug());
    if !shadow_rs::git_clean() {
        log::warn!("built with uncommitted changes");
    }
}
