//! External Band Control Library
//!
//! This crate selects and applies hardware configurations ("band settings")
//! for a radio transceiver's external RF front-end, driving a bank of
//! digital control lines from the tuned local-oscillator frequency.
//!
//! # Architecture
//!
//! - **LineBank**: the fixed, ordered set of control lines, acquired once
//! - **BandSetting**: a named bundle of per-line targets, gated by a
//!   half-open frequency range (or unconditional, for the init/uninit hooks)
//! - **ConfigLoader**: builds and validates the rx/tx settings tables from a
//!   hierarchical configuration source
//! - **BandSelector**: first-match lookup of a frequency in a table
//! - **BandController**: tracks the current setting per lane and applies
//!   new ones differentially, touching only lines whose target changed
//!
//! The rx and tx lanes are tracked independently but share one line bank,
//! so the controller serializes all applies behind a single lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use band_ctl::{BandController, ConfigTree, LineDriver};
//!
//! fn attach<D: LineDriver>(root: &ConfigTree, driver: D) -> Result<(), band_ctl::BandError> {
//!     // None means no control lines are declared: the feature is absent
//!     let Some(ctl) = BandController::register(root, driver)? else {
//!         return Ok(());
//!     };
//!
//!     ctl.on_rx_frequency_change(2_450_000_000)?;
//!     ctl.on_tx_frequency_change(5_800_000_000)?;
//!
//!     ctl.teardown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod line;
pub mod loader;
pub mod selector;
pub mod setting;

pub use config::{ConfigNode, ConfigTree, PropertyValue};
pub use controller::{ApplyOutcome, BandController};
pub use error::{BandError, ConfigError, DriverError, LineIndexError, PropertyError};
pub use line::{Level, LineBank, LineDriver, LineOp};
pub use loader::{BandTables, ConfigLoader, MAX_LINES, MAX_SETTINGS};
pub use selector::BandSelector;
pub use setting::{BandSetting, FreqRange, Frequency, HookKind, Lane, LineValues, SettingId};
