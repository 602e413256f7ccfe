//! Control lines and the bank that owns them
//!
//! A [`LineDriver`] is the primitive that actually asserts a physical state
//! on a named hardware line. The [`LineBank`] acquires every line once, in
//! index order, and then only ever drives them by index.

use std::fmt;

use crate::error::{BandError, DriverError, LineIndexError};

/// Requested state for one control line
///
/// The discriminants are the numeric codes used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineOp {
    /// Leave the line untouched
    #[default]
    NoOp = 0,
    /// Drive the line low
    OutputLow = 1,
    /// Drive the line high
    OutputHigh = 2,
    /// Release the line to high-impedance input
    Input = 3,
}

impl LineOp {
    /// Decode a configuration code, returning `None` for unknown values
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::NoOp),
            1 => Some(Self::OutputLow),
            2 => Some(Self::OutputHigh),
            3 => Some(Self::Input),
            _ => None,
        }
    }

    /// The configuration code for this operation
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::OutputLow => "output-low",
            Self::OutputHigh => "output-high",
            Self::Input => "input",
        }
    }
}

impl TryFrom<u32> for LineOp {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl fmt::Display for LineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output level for a driven line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Low,
    High,
}

/// Hardware primitive for acquiring and driving control lines
///
/// Implementations may block briefly (e.g. for electrical settling) but
/// must have completed the transition when a call returns.
pub trait LineDriver {
    /// Opaque handle to one acquired line
    type Line;
    /// Driver-level failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire the line registered under `name`
    fn acquire(&mut self, name: &str) -> Result<Self::Line, Self::Error>;

    /// Switch the line to high-impedance input
    fn set_input(&mut self, line: &mut Self::Line) -> Result<(), Self::Error>;

    /// Switch the line to a driven output at `level`
    fn set_output(&mut self, line: &mut Self::Line, level: Level) -> Result<(), Self::Error>;
}

/// Fixed, ordered collection of acquired control lines
pub struct LineBank<D: LineDriver> {
    driver: D,
    lines: Vec<D::Line>,
    names: Vec<String>,
}

impl<D: LineDriver> LineBank<D> {
    /// Acquire every named line in order
    ///
    /// The first acquisition failure aborts and is returned as a resource
    /// error naming the line.
    pub fn acquire<I>(mut driver: D, names: I) -> Result<Self, BandError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut lines = Vec::new();
        let mut acquired = Vec::new();

        for name in names {
            let line = driver
                .acquire(&name)
                .map_err(|e| BandError::LineAcquire {
                    name: name.clone(),
                    source: Box::new(e),
                })?;
            lines.push(line);
            acquired.push(name);
        }

        Ok(Self {
            driver,
            lines,
            names: acquired,
        })
    }

    /// Number of lines in the bank
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// Resource name of the line at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Drive line `index` to the state implied by `op`
    ///
    /// `NoOp` makes no driver call. Driver errors are returned unchanged;
    /// an index past [`count`](Self::count) fails with [`LineIndexError`].
    pub fn set(&mut self, index: usize, op: LineOp) -> Result<(), DriverError> {
        let count = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(LineIndexError { index, count })?;
        let result = match op {
            LineOp::NoOp => return Ok(()),
            LineOp::Input => self.driver.set_input(line),
            LineOp::OutputLow => self.driver.set_output(line, Level::Low),
            LineOp::OutputHigh => self.driver.set_output(line, Level::High),
        };
        result.map_err(|e| Box::new(e) as DriverError)
    }

    /// Borrow the underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Release all lines and hand back the driver
    pub fn into_driver(self) -> D {
        self.driver
    }
}

impl<D: LineDriver> fmt::Debug for LineBank<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBank")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("line {0} is stuck")]
    struct Stuck(usize);

    /// Records (line, op) pairs; line 99 refuses to be acquired
    #[derive(Default)]
    struct Recorder {
        writes: Vec<(usize, LineOp)>,
        stuck: Option<usize>,
    }

    impl LineDriver for Recorder {
        type Line = usize;
        type Error = Stuck;

        fn acquire(&mut self, name: &str) -> Result<usize, Stuck> {
            let index = name
                .rsplit('-')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(99);
            if index == 99 {
                return Err(Stuck(index));
            }
            Ok(index)
        }

        fn set_input(&mut self, line: &mut usize) -> Result<(), Stuck> {
            self.writes.push((*line, LineOp::Input));
            Ok(())
        }

        fn set_output(&mut self, line: &mut usize, level: Level) -> Result<(), Stuck> {
            if self.stuck == Some(*line) {
                return Err(Stuck(*line));
            }
            let op = match level {
                Level::Low => LineOp::OutputLow,
                Level::High => LineOp::OutputHigh,
            };
            self.writes.push((*line, op));
            Ok(())
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("band-ctl-{}", i)).collect()
    }

    #[test]
    fn test_codes_round_trip() {
        for code in 0..4 {
            assert_eq!(LineOp::from_code(code).map(LineOp::code), Some(code));
        }
        assert_eq!(LineOp::try_from(4), Err(4));
        assert_eq!(LineOp::from_code(u32::MAX), None);
    }

    #[test]
    fn test_noop_makes_no_driver_call() {
        let mut bank = LineBank::acquire(Recorder::default(), names(2)).unwrap();
        bank.set(0, LineOp::NoOp).unwrap();
        bank.set(1, LineOp::OutputHigh).unwrap();
        bank.set(0, LineOp::Input).unwrap();

        assert_eq!(
            bank.driver().writes,
            vec![(1, LineOp::OutputHigh), (0, LineOp::Input)]
        );
    }

    #[test]
    fn test_acquire_failure_names_line() {
        let err = LineBank::acquire(Recorder::default(), vec!["band-ctl-x".to_string()])
            .unwrap_err();
        assert!(err.is_resource());
        assert!(err.to_string().contains("band-ctl-x"));
    }

    #[test]
    fn test_driver_error_surfaces_unchanged() {
        let driver = Recorder {
            stuck: Some(1),
            ..Default::default()
        };
        let mut bank = LineBank::acquire(driver, names(2)).unwrap();
        let err = bank.set(1, LineOp::OutputLow).unwrap_err();
        assert_eq!(err.downcast_ref::<Stuck>().map(|s| s.0), Some(1));
        assert_eq!(bank.count(), 2);
        assert_eq!(bank.name(1), Some("band-ctl-1"));
    }

    #[test]
    fn test_index_past_bank_is_an_error() {
        let mut bank = LineBank::acquire(Recorder::default(), names(2)).unwrap();
        for op in [LineOp::NoOp, LineOp::OutputHigh] {
            let err = bank.set(2, op).unwrap_err();
            assert_eq!(
                err.downcast_ref::<LineIndexError>(),
                Some(&LineIndexError { index: 2, count: 2 })
            );
        }
        assert!(bank.driver().writes.is_empty());
        assert_eq!(bank.name(2), None);
    }
}
