//! Frequency to band setting lookup
//!
//! Tables are scanned linearly in declaration order. Ranges may overlap and
//! the earliest declared match wins, so the order is load-bearing and must
//! not be replaced by a sorted or indexed structure.

use crate::setting::{BandSetting, Frequency};

/// First-match lookup over an ordered settings table
pub struct BandSelector;

impl BandSelector {
    /// Return the first setting whose range contains `freq`
    ///
    /// `None` (empty table or no match) means "no change requested".
    pub fn select(table: &[BandSetting], freq: Frequency) -> Option<&BandSetting> {
        Self::select_index(table, freq).map(|i| &table[i])
    }

    /// Like [`select`](Self::select), returning the entry's position
    pub fn select_index(table: &[BandSetting], freq: Frequency) -> Option<usize> {
        table.iter().position(|s| s.matches(freq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::FreqRange;

    fn band(name: &str, min: u64, max: u64) -> BandSetting {
        BandSetting::ranged(name, FreqRange::new(min, max), None)
    }

    #[test]
    fn test_empty_table() {
        assert!(BandSelector::select(&[], 100).is_none());
    }

    #[test]
    fn test_first_declared_wins_on_overlap() {
        let table = [band("wide", 0, 100), band("narrow", 50, 150)];
        assert_eq!(BandSelector::select(&table, 75).map(|s| s.name()), Some("wide"));
        assert_eq!(BandSelector::select(&table, 100).map(|s| s.name()), Some("narrow"));
        assert_eq!(BandSelector::select_index(&table, 149), Some(1));
        assert_eq!(BandSelector::select_index(&table, 150), None);
    }

    #[test]
    fn test_edges() {
        let table = [band("a", 2400, 2500), band("b", 5000, 6000)];
        assert_eq!(BandSelector::select_index(&table, 2400), Some(0));
        assert_eq!(BandSelector::select_index(&table, 2500), None);
        assert_eq!(BandSelector::select_index(&table, 4999), None);
        assert_eq!(BandSelector::select_index(&table, 5000), Some(1));
    }
}
