//! Band Control Simulation Library
//!
//! This crate provides a simulation layer for exercising band control
//! without front-end hardware. It includes:
//!
//! - **SimLineDriver**: a line driver that tracks line states, records every
//!   write and can inject faults
//! - **BandConfigBuilder** and JSON loading for configuration trees
//! - **VirtualPhy**: a stand-in transceiver that owns the controller and
//!   forwards LO changes to it
//!
//! # Example
//!
//! ```rust
//! use band_ctl::LineOp::{OutputHigh, OutputLow};
//! use band_sim::{BandConfigBuilder, SimLineDriver, VirtualPhy};
//!
//! let config = BandConfigBuilder::new("ad9361-phy", 2)
//!     .rx(2_400_000_000, 2_500_000_000, &[OutputLow, OutputHigh])
//!     .rx(5_000_000_000, 6_000_000_000, &[OutputHigh, OutputLow])
//!     .build();
//!
//! let lines = SimLineDriver::new();
//! let mut phy = VirtualPhy::attach("phy0", &config, lines.clone()).unwrap();
//!
//! phy.set_rx_lo(2_450_000_000).unwrap();
//! assert_eq!(lines.write_count(), 2);
//!
//! // Same band: nothing is rewritten
//! phy.set_rx_lo(2_460_000_000).unwrap();
//! assert_eq!(lines.write_count(), 2);
//! ```

pub mod driver;
pub mod phy;
pub mod tree;

pub use driver::{LineState, LineWrite, SimLine, SimLineDriver, SimLineError};
pub use phy::VirtualPhy;
pub use tree::{tree_from_json, tree_from_json_file, tree_to_json, BandConfigBuilder, TreeLoadError};
