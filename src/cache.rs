//! Scan-position memoization for row-major text grids
//!
//! A text grid cannot be indexed by row: every value before a row has to be
//! scanned to find where the row starts. [`TileMarkers`] remembers, for some
//! scan counts, the byte offset reached after that many samples, so later
//! reads can resume from the nearest known point.

use std::collections::BTreeMap;

/// Ordered index from samples scanned to stream byte offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileMarkers {
    markers: BTreeMap<u64, u64>,
}

impl TileMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact entry for `samples`, else the nearest lower one
    pub fn floor(&self, samples: u64) -> Option<(u64, u64)> {
        self.markers
            .range(..=samples)
            .next_back()
            .map(|(&count, &position)| (count, position))
    }

    /// Records that `samples` values end at byte `position`
    ///
    /// Entries stay increasing in both count and position; an entry that
    /// would break that order is rejected and `false` returned. Re-recording
    /// an existing count keeps the original position.
    pub fn insert(&mut self, samples: u64, position: u64) -> bool {
        if self.markers.contains_key(&samples) {
            return true;
        }
        if let Some((_, &lower)) = self.markers.range(..samples).next_back() {
            if lower >= position {
                return false;
            }
        }
        if let Some((_, &upper)) = self.markers.range(samples..).next() {
            if upper <= position {
                return false;
            }
        }
        self.markers.insert(samples, position);
        true
    }

    /// Returns the number of recorded markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Returns whether no marker is recorded
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Clears all markers
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Markers in increasing order
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.markers.iter().map(|(&count, &position)| (count, position))
    }
}
