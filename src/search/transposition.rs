//! [Transposition Table] caching search results by Zobrist key.
//!
//! The table is a power-of-two array of [`Cluster`]s. The low bits of a key
//! select the cluster and the top 16 bits (the tag) tell entries within the
//! cluster apart, so the same bits never serve both purposes. A cluster is 32
//! bytes and 32-byte aligned: a probe touches exactly one cache line.
//!
//! Entry layout (8 bytes, `#[repr(C)]`, native byte order):
//!
//! | Bytes | Field    | Contents                                           |
//! | ----- | -------- | -------------------------------------------------- |
//! | 0..2  | `tag`    | Bits 48..64 of the key, `0` marks an empty entry   |
//! | 2..4  | `value`  | Score relative to the node (see [`Score::to_table`]) |
//! | 4..6  | `action` | [`crate::game::Action::index`] + 1, `0` is no move |
//! | 6     | `depth`  | Remaining depth of the search that produced it     |
//! | 7     | `bound`  | [`Bound`] discriminant                             |
//!
//! [Transposition Table]: https://www.chessprogramming.org/Transposition_Table

use crate::error::{Error, Result};
use crate::evaluation::Score;
use crate::search::Depth;
use crate::zobrist::Key;

const CACHE_LINE: usize = 64;
const CLUSTER_SIZE: usize = 4;

/// How the stored value relates to the true value of the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Empty entry.
    None = 0,
    /// The value is exact: it fell strictly inside the search window.
    Exact = 1,
    /// The search failed high (beta cutoff): the true value is at least this.
    Lower = 2,
    /// The search failed low: the true value is at most this.
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Self::Exact,
            2 => Self::Lower,
            3 => Self::Upper,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
struct Entry {
    tag: u16,
    value: i16,
    action: u16,
    depth: u8,
    bound: u8,
}

const _: () = assert!(size_of::<Entry>() == 8);

impl Entry {
    const fn is_empty(&self) -> bool {
        self.tag == 0
    }

    fn hit(&self) -> Hit {
        Hit {
            value: self.value,
            action: self.action.checked_sub(1),
            depth: self.depth,
            bound: Bound::from_bits(self.bound),
        }
    }
}

/// Group of entries sharing one table index, sized so that it never straddles
/// a cache line.
#[derive(Clone, Copy, Debug, Default)]
#[repr(C, align(32))]
pub struct Cluster {
    entries: [Entry; CLUSTER_SIZE],
}

const _: () = assert!(CACHE_LINE % size_of::<Cluster>() == 0);

/// Data of a matching entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    /// Node-relative value, convert with [`Score::from_table`].
    pub value: i16,
    /// Index of the best or refutation move.
    pub action: Option<u16>,
    /// Remaining depth the value was computed with.
    pub depth: Depth,
    /// Kind of the value.
    pub bound: Bound,
}

/// Position of an entry inside the table, valid until the table is resized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    cluster: usize,
    entry: usize,
}

/// Result of [`TranspositionTable::probe`]: the entry for the key if there is
/// one and the slot to write the new result into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    /// Cached result for the key.
    pub hit: Option<Hit>,
    /// The matching entry, an empty one or the least valuable one.
    pub slot: Slot,
}

/// Fixed-capacity cache of search results.
#[derive(Debug)]
pub struct TranspositionTable {
    clusters: Vec<Cluster>,
}

fn tag_of(key: Key) -> u16 {
    // A zero tag marks empty entries.
    ((key >> 48) as u16).max(1)
}

fn is_known(value: i16) -> bool {
    Score::from_table(value, 0).is_known()
}

fn is_known_loss(value: i16) -> bool {
    Score::from_table(value, 0).is_loss()
}

impl TranspositionTable {
    /// Allocates the largest table that fits into `bytes`.
    ///
    /// # Errors
    ///
    /// Fails if `bytes` can not hold a single cluster or if the allocation
    /// fails.
    pub fn new(bytes: usize) -> Result<Self> {
        let mut table = Self {
            clusters: Vec::new(),
        };
        table.resize(bytes)?;
        Ok(table)
    }

    /// Smallest accepted memory budget: one cluster and one cache line of
    /// alignment slack.
    #[must_use]
    pub const fn min_bytes() -> usize {
        size_of::<Cluster>() + CACHE_LINE
    }

    /// Largest power-of-two number of clusters that fits into `bytes`.
    fn cluster_count_for(bytes: usize) -> Option<usize> {
        let fit = bytes.checked_sub(CACHE_LINE)? / size_of::<Cluster>();
        (fit > 0).then(|| 1 << fit.ilog2())
    }

    /// Reallocates the table to the largest size fitting into `bytes`,
    /// emptying it. Does nothing (and keeps the contents) if the size does not
    /// change.
    ///
    /// # Errors
    ///
    /// Fails if `bytes` can not hold a single cluster or if the allocation
    /// fails. The table is left untouched in both cases.
    pub fn resize(&mut self, bytes: usize) -> Result<()> {
        let count = Self::cluster_count_for(bytes).ok_or(Error::TableTooSmall {
            requested: bytes,
            minimum: Self::min_bytes(),
        })?;
        if count == self.clusters.len() {
            return Ok(());
        }
        let mut clusters = Vec::new();
        clusters
            .try_reserve_exact(count)
            .map_err(|source| Error::Allocation {
                clusters: count,
                source,
            })?;
        clusters.resize(count, Cluster::default());
        self.clusters = clusters;
        log::info!(
            "allocated {} KiB for the transposition table ({count} clusters)",
            self.byte_size() >> 10
        );
        Ok(())
    }

    /// Empties every entry.
    pub fn clear(&mut self) {
        self.clusters.fill(Cluster::default());
    }

    /// Number of clusters, always a power of two.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Memory used by the entries.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.clusters.len() * size_of::<Cluster>()
    }

    /// Per-mille of occupied entries, sampled from the first clusters.
    #[must_use]
    pub fn hashfull(&self) -> usize {
        let sample = &self.clusters[..self.clusters.len().min(1000 / CLUSTER_SIZE)];
        let occupied = sample
            .iter()
            .flat_map(|cluster| cluster.entries.iter())
            .filter(|entry| !entry.is_empty())
            .count();
        occupied * 1000 / (sample.len() * CLUSTER_SIZE)
    }

    /// Looks the key up.
    ///
    /// Scans the cluster selected by the low bits of the key and stops at the
    /// first entry that is either empty or carries the key's tag. If there is
    /// neither, the returned slot is the entry with the lowest value, skipping
    /// proven losses: refutations stay useful for pruning at any depth.
    #[must_use]
    pub fn probe(&self, key: Key) -> Probe {
        let index = (key as usize) & (self.clusters.len() - 1);
        let tag = tag_of(key);
        let entries = &self.clusters[index].entries;
        for (i, entry) in entries.iter().enumerate() {
            if entry.is_empty() || entry.tag == tag {
                return Probe {
                    hit: (!entry.is_empty()).then(|| entry.hit()),
                    slot: Slot {
                        cluster: index,
                        entry: i,
                    },
                };
            }
        }
        let victim = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !is_known_loss(entry.value))
            .min_by_key(|(_, entry)| entry.value)
            .map_or(0, |(i, _)| i);
        Probe {
            hit: None,
            slot: Slot {
                cluster: index,
                entry: victim,
            },
        }
    }

    /// Writes a search result into a slot obtained from [`Self::probe`].
    ///
    /// The entry is replaced entirely if it belongs to another key, if the
    /// new value is a proven win or loss, or if the new search is at least as
    /// deep and the stored value is not a proven result. Otherwise only the
    /// best move hint is refreshed.
    pub fn store(
        &mut self,
        slot: Slot,
        key: Key,
        value: i16,
        depth: Depth,
        action: Option<u16>,
        bound: Bound,
    ) {
        let entry = &mut self.clusters[slot.cluster].entries[slot.entry];
        let tag = tag_of(key);
        let action = action.map_or(0, |index| index + 1);
        let other_key = entry.tag != tag;
        if other_key || is_known(value) || (depth >= entry.depth && !is_known(entry.value)) {
            *entry = Entry {
                tag,
                value,
                action: if action != 0 || other_key {
                    action
                } else {
                    entry.action
                },
                depth,
                bound: bound as u8,
            };
        } else if action != 0 {
            entry.action = action;
        }
    }
}
