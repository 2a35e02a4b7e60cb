//! [Zobrist hashing]: every orthogonal feature of a state ("pawn of White on
//! c4", "Black to move", "speed is 7") gets an independent random key and the
//! key of a state is the XOR of the keys of all features that hold in it.
//!
//! Because XOR is its own inverse, a move that toggles a handful of features
//! updates the key by XOR-ing those same keys, and taking the move back XORs
//! them again. Games therefore only call [`Zobrist::compose`] once for the
//! initial state and maintain the key incrementally afterwards.
//!
//! The feature space has to be enumerable up front: games map each
//! (feature, value) pair to a dense index in `0..features`.
//!
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Zobrist keys are 64-bit unsigned integers that are computed once a state
/// is created and updated whenever a move is made.
pub type Key = u64;

/// Table of random keys, one per feature index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zobrist {
    keys: Box<[Key]>,
}

impl Zobrist {
    /// Draws `features` non-zero keys from a generator seeded with `seed`. The
    /// same seed always produces the same keys.
    #[must_use]
    pub fn new(features: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = (0..features)
            .map(|_| loop {
                let key: Key = rng.next_u64();
                if key != 0 {
                    break key;
                }
            })
            .collect();
        Self { keys }
    }

    /// Key of the feature with the given index.
    #[must_use]
    pub fn key(&self, feature: usize) -> Key {
        self.keys[feature]
    }

    /// XOR of the keys of all given features. Used to seed incremental
    /// hashing at the root.
    #[must_use]
    pub fn compose(&self, features: impl IntoIterator<Item = usize>) -> Key {
        features
            .into_iter()
            .fold(0, |key, feature| key ^ self.key(feature))
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the table has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
