//! Simulated control line driver
//!
//! Tracks the electrical state of every line, records each write in order,
//! and can inject faults so partial-apply behaviour can be exercised
//! without hardware.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use band_ctl::{Level, LineDriver, LineOp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Electrical state of a simulated line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineState {
    /// Acquired but never driven
    Unconfigured,
    Input,
    Output(Level),
}

/// One successful write, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWrite {
    pub line: String,
    pub op: LineOp,
}

/// Errors produced by the simulated driver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimLineError {
    /// Name not registered with a strict driver
    #[error("no line named '{0}'")]
    UnknownLine(String),

    /// Line already handed out
    #[error("line '{0}' is already in use")]
    Busy(String),

    /// Write rejected by fault injection
    #[error("injected fault on line '{0}'")]
    Fault(String),
}

/// Handle to an acquired simulated line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimLine {
    name: String,
}

impl SimLine {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
struct SimState {
    strict: bool,
    lines: BTreeMap<String, LineState>,
    acquired: HashSet<String>,
    writes: Vec<LineWrite>,
    faulty: HashSet<String>,
    /// Successful writes remaining before every write faults
    writes_until_fault: Option<usize>,
}

/// Simulated line driver
///
/// Clones share the same state, so a test can keep one clone for
/// inspection after handing another to a controller.
#[derive(Debug, Clone, Default)]
pub struct SimLineDriver {
    state: Arc<Mutex<SimState>>,
}

impl SimLineDriver {
    /// A permissive driver that creates lines on first acquisition
    pub fn new() -> Self {
        Self::default()
    }

    /// A strict driver that only knows the given line names
    pub fn with_lines<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = names
            .into_iter()
            .map(|n| (n.into(), LineState::Unconfigured))
            .collect();
        Self {
            state: Arc::new(Mutex::new(SimState {
                strict: true,
                lines,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of a line, `None` if it does not exist
    pub fn line_state(&self, name: &str) -> Option<LineState> {
        self.lock().lines.get(name).copied()
    }

    /// All known lines and their states, ordered by name
    pub fn line_states(&self) -> Vec<(String, LineState)> {
        self.lock()
            .lines
            .iter()
            .map(|(name, state)| (name.clone(), *state))
            .collect()
    }

    /// Every successful write so far
    pub fn writes(&self) -> Vec<LineWrite> {
        self.lock().writes.clone()
    }

    /// Drain the write log
    pub fn take_writes(&self) -> Vec<LineWrite> {
        std::mem::take(&mut self.lock().writes)
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Make every write to `name` fail until faults are cleared
    pub fn fail_line(&self, name: impl Into<String>) {
        self.lock().faulty.insert(name.into());
    }

    /// Allow `count` more successful writes, then fail all writes
    pub fn fail_after(&self, count: usize) {
        self.lock().writes_until_fault = Some(count);
    }

    pub fn clear_faults(&self) {
        let mut state = self.lock();
        state.faulty.clear();
        state.writes_until_fault = None;
    }

    fn drive(&self, line: &SimLine, op: LineOp, new_state: LineState) -> Result<(), SimLineError> {
        let mut state = self.lock();

        if state.faulty.contains(&line.name) || state.writes_until_fault == Some(0) {
            return Err(SimLineError::Fault(line.name.clone()));
        }
        if let Some(remaining) = state.writes_until_fault.as_mut() {
            *remaining -= 1;
        }

        state.lines.insert(line.name.clone(), new_state);
        state.writes.push(LineWrite {
            line: line.name.clone(),
            op,
        });
        debug!("[SIM] {} -> {}", line.name, op);
        Ok(())
    }
}

impl LineDriver for SimLineDriver {
    type Line = SimLine;
    type Error = SimLineError;

    fn acquire(&mut self, name: &str) -> Result<SimLine, SimLineError> {
        let mut state = self.lock();
        if state.strict && !state.lines.contains_key(name) {
            return Err(SimLineError::UnknownLine(name.to_string()));
        }
        if !state.acquired.insert(name.to_string()) {
            return Err(SimLineError::Busy(name.to_string()));
        }
        state
            .lines
            .entry(name.to_string())
            .or_insert(LineState::Unconfigured);
        Ok(SimLine {
            name: name.to_string(),
        })
    }

    fn set_input(&mut self, line: &mut SimLine) -> Result<(), SimLineError> {
        self.drive(line, LineOp::Input, LineState::Input)
    }

    fn set_output(&mut self, line: &mut SimLine, level: Level) -> Result<(), SimLineError> {
        let op = match level {
            Level::Low => LineOp::OutputLow,
            Level::High => LineOp::OutputHigh,
        };
        self.drive(line, op, LineState::Output(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_acquire() {
        let mut driver = SimLineDriver::new();
        let line = driver.acquire("band-ctl-0").unwrap();
        assert_eq!(line.name(), "band-ctl-0");
        assert_eq!(driver.line_state("band-ctl-0"), Some(LineState::Unconfigured));
        assert_eq!(
            driver.acquire("band-ctl-0"),
            Err(SimLineError::Busy("band-ctl-0".into()))
        );
    }

    #[test]
    fn test_strict_acquire() {
        let mut driver = SimLineDriver::with_lines(["band-ctl-0"]);
        assert!(driver.acquire("band-ctl-0").is_ok());
        assert_eq!(
            driver.acquire("band-ctl-1"),
            Err(SimLineError::UnknownLine("band-ctl-1".into()))
        );
        assert_eq!(
            driver.line_states(),
            vec![("band-ctl-0".to_string(), LineState::Unconfigured)]
        );
    }

    #[test]
    fn test_writes_tracked() {
        let mut driver = SimLineDriver::new();
        let probe = driver.clone();
        let mut line = driver.acquire("a").unwrap();

        driver.set_output(&mut line, Level::High).unwrap();
        driver.set_input(&mut line).unwrap();

        assert_eq!(probe.line_state("a"), Some(LineState::Input));
        assert_eq!(probe.writes().len(), 2);
        assert_eq!(probe.write_count(), 2);
        assert_eq!(
            probe.take_writes(),
            vec![
                LineWrite { line: "a".into(), op: LineOp::OutputHigh },
                LineWrite { line: "a".into(), op: LineOp::Input },
            ]
        );
        assert_eq!(probe.write_count(), 0);
    }

    #[test]
    fn test_fault_injection() {
        let mut driver = SimLineDriver::new();
        let mut a = driver.acquire("a").unwrap();
        let mut b = driver.acquire("b").unwrap();

        driver.fail_line("b");
        driver.set_output(&mut a, Level::Low).unwrap();
        assert_eq!(
            driver.set_output(&mut b, Level::Low),
            Err(SimLineError::Fault("b".into()))
        );
        assert_eq!(driver.line_state("b"), Some(LineState::Unconfigured));

        driver.clear_faults();
        driver.fail_after(1);
        driver.set_input(&mut b).unwrap();
        assert!(driver.set_input(&mut a).is_err());
        assert_eq!(driver.write_count(), 2);
    }
}
