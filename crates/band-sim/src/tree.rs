//! Configuration trees for simulation
//!
//! Loads [`ConfigTree`] descriptions from JSON and offers a builder that
//! lays out lines, hooks and settings tables under the names the loader
//! expects.
//!
//! A JSON description mirrors the tree directly:
//!
//! ```json
//! {
//!   "name": "ad9361-phy",
//!   "properties": { "band-ctl-0-gpio": "gpio0 12", "band-ctl-1-gpio": "gpio0 13" },
//!   "children": [
//!     {
//!       "name": "adi_rx_band_setting_0",
//!       "properties": {
//!         "adi,lo-freq-min": 70000000,
//!         "adi,lo-freq-max": 3000000000,
//!         "adi,gpio-settings": [1, 2]
//!       }
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use band_ctl::loader::{
    line_property, INIT_HOOK_NODE, PROP_FREQ_MAX, PROP_FREQ_MIN, PROP_LINE_SETTINGS,
    UNINIT_HOOK_NODE,
};
use band_ctl::{ConfigTree, Lane, LineOp};
use thiserror::Error;

/// Errors loading a configuration tree
#[derive(Debug, Error)]
pub enum TreeLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration tree: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse a configuration tree from JSON text
pub fn tree_from_json(json: &str) -> Result<ConfigTree, TreeLoadError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a configuration tree from a JSON file
pub fn tree_from_json_file(path: impl AsRef<Path>) -> Result<ConfigTree, TreeLoadError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| TreeLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tree_from_json(&json)
}

/// Render a configuration tree as pretty-printed JSON
pub fn tree_to_json(tree: &ConfigTree) -> Result<String, TreeLoadError> {
    Ok(serde_json::to_string_pretty(tree)?)
}

fn codes(ops: &[LineOp]) -> Vec<u32> {
    ops.iter().map(|op| op.code()).collect()
}

/// Builds a band control configuration tree
///
/// Table entries are numbered in the order they are added.
#[derive(Debug, Clone)]
pub struct BandConfigBuilder {
    root: ConfigTree,
    rx_entries: usize,
    tx_entries: usize,
}

impl BandConfigBuilder {
    /// Start a tree for node `name` declaring `lines` control lines
    pub fn new(name: impl Into<String>, lines: usize) -> Self {
        let mut root = ConfigTree::new(name);
        for i in 0..lines {
            root.set_property(line_property(i), format!("gpio0 {}", i));
        }
        Self {
            root,
            rx_entries: 0,
            tx_entries: 0,
        }
    }

    /// Append a table entry with line targets
    pub fn band(mut self, lane: Lane, min: u64, max: u64, ops: &[LineOp]) -> Self {
        let node = self.next_entry(lane, min, max).with_property(PROP_LINE_SETTINGS, codes(ops));
        self.root.add_child(node);
        self
    }

    /// Append a table entry that changes no lines
    pub fn quiet_band(mut self, lane: Lane, min: u64, max: u64) -> Self {
        let node = self.next_entry(lane, min, max);
        self.root.add_child(node);
        self
    }

    pub fn rx(self, min: u64, max: u64, ops: &[LineOp]) -> Self {
        self.band(Lane::Rx, min, max, ops)
    }

    pub fn tx(self, min: u64, max: u64, ops: &[LineOp]) -> Self {
        self.band(Lane::Tx, min, max, ops)
    }

    pub fn init_hook(mut self, ops: &[LineOp]) -> Self {
        self.root
            .add_child(ConfigTree::new(INIT_HOOK_NODE).with_property(PROP_LINE_SETTINGS, codes(ops)));
        self
    }

    pub fn uninit_hook(mut self, ops: &[LineOp]) -> Self {
        self.root
            .add_child(ConfigTree::new(UNINIT_HOOK_NODE).with_property(PROP_LINE_SETTINGS, codes(ops)));
        self
    }

    pub fn build(self) -> ConfigTree {
        self.root
    }

    fn next_entry(&mut self, lane: Lane, min: u64, max: u64) -> ConfigTree {
        let counter = match lane {
            Lane::Rx => &mut self.rx_entries,
            Lane::Tx => &mut self.tx_entries,
        };
        let name = format!("{}{}", lane.table_prefix(), counter);
        *counter += 1;
        ConfigTree::new(name)
            .with_property(PROP_FREQ_MIN, min)
            .with_property(PROP_FREQ_MAX, max)
    }
}
