//! Error types for band control construction and operation

use thiserror::Error;

/// Boxed error produced by a line driver, carried unchanged to the caller
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A line index past the end of a bank
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no control line at index {index}, bank has {count}")]
pub struct LineIndexError {
    pub index: usize,
    pub count: usize,
}

/// Errors reading a single property from a configuration node
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// Property exists but holds a different kind of value
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Array element does not fit the requested width
    #[error("value {value} at index {index} does not fit in u32")]
    OutOfRange { value: u64, index: usize },
}

/// Validation failures while building settings from configuration
///
/// Every variant names the entry it was raised for. Any of these aborts
/// the whole construction; no partial table is kept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required property is absent
    #[error("'{entry}': missing required property '{property}'")]
    MissingProperty { entry: String, property: String },

    /// A property is present but unreadable
    #[error("'{entry}': cannot read '{property}': {source}")]
    InvalidProperty {
        entry: String,
        property: String,
        #[source]
        source: PropertyError,
    },

    /// Line settings array length is neither zero nor the line count
    #[error("'{entry}': line settings have {found} entries, expected {expected}")]
    SettingsLength {
        entry: String,
        expected: usize,
        found: usize,
    },

    /// Line settings array holds a code outside the known operations
    #[error("'{entry}': invalid line setting {value} at position {position}")]
    InvalidLineCode {
        entry: String,
        value: u32,
        position: usize,
    },

    /// Frequency range lower bound exceeds the upper bound
    #[error("'{entry}': frequency range {min}..{max} is inverted")]
    InvertedRange { entry: String, min: u64, max: u64 },

    /// Counting and parsing passes disagree on a table's size
    #[error("'{prefix}*': counted {counted} entries but parsed {parsed}")]
    CountMismatch {
        prefix: String,
        counted: usize,
        parsed: usize,
    },
}

/// Top-level error for band control operations
#[derive(Debug, Error)]
pub enum BandError {
    /// Configuration could not be turned into a valid controller
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A control line handle could not be acquired
    #[error("failed to acquire line '{name}': {source}")]
    LineAcquire {
        name: String,
        #[source]
        source: DriverError,
    },

    /// The line driver rejected a write while applying a setting
    #[error("setting '{setting}': failed to drive line {line}: {source}")]
    Hardware {
        setting: String,
        line: usize,
        #[source]
        source: DriverError,
    },
}

impl BandError {
    /// Construction failed on configuration content
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Construction failed acquiring a hardware resource
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::LineAcquire { .. })
    }

    /// A line write failed; the lane may be left in a mixed state
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_entry() {
        let err = ConfigError::InvalidLineCode {
            entry: "adi_rx_band_setting_2".into(),
            value: 7,
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "'adi_rx_band_setting_2': invalid line setting 7 at position 3"
        );
    }

    #[test]
    fn test_classification() {
        let config: BandError = ConfigError::MissingProperty {
            entry: "x".into(),
            property: "adi,lo-freq-min".into(),
        }
        .into();
        assert!(config.is_config());
        assert!(!config.is_hardware());

        let hw = BandError::Hardware {
            setting: "x".into(),
            line: 1,
            source: "bus fault".into(),
        };
        assert!(hw.is_hardware());
        assert!(!hw.is_resource());
        assert_eq!(hw.to_string(), "setting 'x': failed to drive line 1: bus fault");
    }
}
