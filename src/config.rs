//! Engine configuration shared by the library and the command line driver.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::search::transposition::TranspositionTable;
use crate::search::{Depth, MAX_DEPTH};

/// Resources and limits of a [`crate::Searcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Memory budget of the transposition table in bytes.
    pub hash_bytes: usize,
    /// Wall-clock budget for a single decision.
    pub move_time: Duration,
    /// Deepest iterative deepening layer.
    pub max_depth: Depth,
    /// Seed for the Zobrist keys of the games constructed by the driver.
    pub seed: u64,
}

impl Config {
    /// 16 MiB.
    pub const DEFAULT_HASH_BYTES: usize = 16 << 20;
    /// Seed used when none is given, so that runs are reproducible.
    pub const DEFAULT_SEED: u64 = 0x5eed_cafe_f00d_0001;

    /// Checks that the configuration can be used to build a searcher.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a table budget below a single cluster,
    /// a zero move time or a depth beyond [`MAX_DEPTH`].
    pub fn validate(&self) -> Result<()> {
        let minimum = TranspositionTable::min_bytes();
        if self.hash_bytes < minimum {
            return Err(Error::TableTooSmall {
                requested: self.hash_bytes,
                minimum,
            });
        }
        if self.move_time.is_zero() {
            return Err(Error::ZeroTimeBudget);
        }
        if self.max_depth > MAX_DEPTH {
            return Err(Error::DepthTooLarge {
                requested: self.max_depth,
                maximum: MAX_DEPTH,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_bytes: Self::DEFAULT_HASH_BYTES,
            move_time: Duration::from_millis(100),
            max_depth: MAX_DEPTH,
            seed: Self::DEFAULT_SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn tiny_table() {
        let config = Config {
            hash_bytes: 64,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::TableTooSmall { requested: 64, .. })
        ));
    }

    #[test]
    fn zero_time() {
        let config = Config {
            move_time: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ZeroTimeBudget)));
    }

    #[test]
    fn too_deep() {
        let config = Config {
            max_depth: MAX_DEPTH + 1,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::DepthTooLarge { .. })
        ));
    }
}
