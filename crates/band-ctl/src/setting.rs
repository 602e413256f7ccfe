//! Band setting records
//!
//! A [`BandSetting`] is an immutable, named bundle of per-line target
//! states. Table entries are gated by a half-open [`FreqRange`]; the two
//! lifecycle hooks have no range and are applied unconditionally.

use std::fmt;

use crate::error::ConfigError;
use crate::line::LineOp;

/// Tuned frequency, in whatever unit the caller uses (typically Hz)
pub type Frequency = u64;

/// Half-open frequency range `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FreqRange {
    pub min: Frequency,
    pub max: Frequency,
}

impl FreqRange {
    /// Create a range; `min > max` is rejected by the loader, not here
    pub fn new(min: Frequency, max: Frequency) -> Self {
        Self { min, max }
    }

    /// Min inclusive, max exclusive
    pub fn contains(&self, freq: Frequency) -> bool {
        self.min <= freq && freq < self.max
    }
}

impl fmt::Display for FreqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Per-line target states, one entry per line in the bank
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineValues(Vec<LineOp>);

impl LineValues {
    /// Validate raw configuration codes for `entry`
    ///
    /// Fails on the first code that is not a known [`LineOp`], reporting
    /// the value and its position.
    pub fn from_codes(entry: &str, codes: &[u32]) -> Result<Self, ConfigError> {
        codes
            .iter()
            .enumerate()
            .map(|(position, &value)| {
                LineOp::from_code(value).ok_or_else(|| ConfigError::InvalidLineCode {
                    entry: entry.to_string(),
                    value,
                    position,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Target state of line `index`
    pub fn get(&self, index: usize) -> Option<LineOp> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[LineOp] {
        &self.0
    }
}

impl From<Vec<LineOp>> for LineValues {
    fn from(ops: Vec<LineOp>) -> Self {
        Self(ops)
    }
}

/// Renders the numeric codes, comma separated (e.g. `1,2,0`)
impl fmt::Display for LineValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", op.code())?;
        }
        Ok(())
    }
}

/// A named bundle of per-line target states
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandSetting {
    name: String,
    range: Option<FreqRange>,
    values: Option<LineValues>,
}

impl BandSetting {
    /// A frequency-gated table entry
    pub fn ranged(name: impl Into<String>, range: FreqRange, values: Option<LineValues>) -> Self {
        Self {
            name: name.into(),
            range: Some(range),
            values,
        }
    }

    /// An unconditional lifecycle hook
    pub fn hook(name: impl Into<String>, values: Option<LineValues>) -> Self {
        Self {
            name: name.into(),
            range: None,
            values,
        }
    }

    /// Configuration entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frequency range, `None` for hooks
    pub fn range(&self) -> Option<FreqRange> {
        self.range
    }

    /// Line targets, `None` when the setting changes no lines
    pub fn values(&self) -> Option<&LineValues> {
        self.values.as_ref()
    }

    pub fn is_hook(&self) -> bool {
        self.range.is_none()
    }

    /// Whether a lookup for `freq` should select this setting
    ///
    /// Hooks never match.
    pub fn matches(&self, freq: Frequency) -> bool {
        self.range.is_some_and(|r| r.contains(freq))
    }
}

/// Receive or transmit path, tracked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lane {
    Rx,
    Tx,
}

impl Lane {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rx => "rx",
            Self::Tx => "tx",
        }
    }
}

/// Lifecycle hook slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HookKind {
    /// Applied once at registration; both lanes start here
    Init,
    /// Applied best-effort at teardown
    Uninit,
}

/// Identity of one stored setting
///
/// Two lookups selecting the same table entry yield equal ids, which is what
/// the controller compares to skip redundant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SettingId {
    Hook(HookKind),
    Table(Lane, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_half_open() {
        let range = FreqRange::new(2400, 2500);
        assert!(range.contains(2400));
        assert!(range.contains(2499));
        assert!(!range.contains(2500));
        assert!(!range.contains(2399));
        assert!(!FreqRange::new(10, 10).contains(10));
    }

    #[test]
    fn test_invalid_code_reports_position() {
        let err = LineValues::from_codes("band_a", &[1, 2, 9, 3]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidLineCode {
                entry: "band_a".into(),
                value: 9,
                position: 2,
            }
        );
    }

    #[test]
    fn test_values_display() {
        let values = LineValues::from_codes("band_a", &[1, 2, 0, 3]).unwrap();
        assert_eq!(values.to_string(), "1,2,0,3");
        assert_eq!(values.get(3), Some(LineOp::Input));
        assert_eq!(values.get(4), None);
    }

    #[test]
    fn test_hooks_never_match() {
        let hook = BandSetting::hook("adi_ext_band_ctl_init", None);
        assert!(hook.is_hook());
        assert!(!hook.matches(0));

        let band = BandSetting::ranged("band", FreqRange::new(0, 100), None);
        assert!(band.matches(0));
        assert!(!band.is_hook());
    }
}
