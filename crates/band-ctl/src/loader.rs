//! Building band settings from configuration
//!
//! Discovery is gap-terminated everywhere: lines are probed at
//! `band-ctl-0-gpio`, `band-ctl-1-gpio`, ... and table entries at
//! `<prefix>0`, `<prefix>1`, ... until the first missing index. Later
//! indices past a gap are never looked at.
//!
//! Every entry is fully validated. The first failure aborts the load and
//! nothing partially built is returned.

use tracing::{debug, error};

use crate::config::ConfigNode;
use crate::error::{ConfigError, PropertyError};
use crate::setting::{BandSetting, FreqRange, HookKind, Lane, LineValues};

/// Upper bound on control lines in one bank
pub const MAX_LINES: usize = 256;

/// Upper bound on entries in one settings table
pub const MAX_SETTINGS: usize = 512;

/// Child node holding the init hook
pub const INIT_HOOK_NODE: &str = "adi_ext_band_ctl_init";

/// Child node holding the uninit hook
pub const UNINIT_HOOK_NODE: &str = "adi_ext_band_ctl_uninit";

/// Name prefix of receive table entries
pub const RX_TABLE_PREFIX: &str = "adi_rx_band_setting_";

/// Name prefix of transmit table entries
pub const TX_TABLE_PREFIX: &str = "adi_tx_band_setting_";

pub const PROP_FREQ_MIN: &str = "adi,lo-freq-min";
pub const PROP_FREQ_MAX: &str = "adi,lo-freq-max";
pub const PROP_LINE_SETTINGS: &str = "adi,gpio-settings";

/// Property announcing control line `index`
pub fn line_property(index: usize) -> String {
    format!("band-ctl-{}-gpio", index)
}

/// Resource name used to acquire control line `index`
pub fn line_name(index: usize) -> String {
    format!("band-ctl-{}", index)
}

impl HookKind {
    pub const ALL: [HookKind; 2] = [HookKind::Init, HookKind::Uninit];

    /// Configuration node name for this hook
    pub fn node_name(&self) -> &'static str {
        match self {
            Self::Init => INIT_HOOK_NODE,
            Self::Uninit => UNINIT_HOOK_NODE,
        }
    }
}

impl Lane {
    /// Configuration name prefix of this lane's table
    pub fn table_prefix(&self) -> &'static str {
        match self {
            Self::Rx => RX_TABLE_PREFIX,
            Self::Tx => TX_TABLE_PREFIX,
        }
    }
}

/// Count contiguous control line properties under `root`, capped at [`MAX_LINES`]
pub fn count_lines<C: ConfigNode>(root: &C) -> usize {
    (0..MAX_LINES)
        .take_while(|&i| root.has_property(&line_property(i)))
        .count()
}

/// Everything parsed from configuration, ready to drive a line bank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandTables {
    pub init: Option<BandSetting>,
    pub uninit: Option<BandSetting>,
    pub rx: Vec<BandSetting>,
    pub tx: Vec<BandSetting>,
}

impl BandTables {
    pub fn table(&self, lane: Lane) -> &[BandSetting] {
        match lane {
            Lane::Rx => &self.rx,
            Lane::Tx => &self.tx,
        }
    }

    pub fn hook(&self, kind: HookKind) -> Option<&BandSetting> {
        match kind {
            HookKind::Init => self.init.as_ref(),
            HookKind::Uninit => self.uninit.as_ref(),
        }
    }

    /// Hooks present in configuration, init first
    pub fn hooks(&self) -> impl Iterator<Item = HookKind> + '_ {
        HookKind::ALL
            .into_iter()
            .filter(|&kind| self.hook(kind).is_some())
    }
}

/// Parses hooks and settings tables for a bank of known size
pub struct ConfigLoader<'a, C: ConfigNode> {
    root: &'a C,
    line_count: usize,
}

impl<'a, C: ConfigNode> ConfigLoader<'a, C> {
    /// Create a loader validating line settings against `line_count` lines
    pub fn new(root: &'a C, line_count: usize) -> Self {
        Self { root, line_count }
    }

    /// Parse both hooks and both tables
    pub fn load(&self) -> Result<BandTables, ConfigError> {
        Ok(BandTables {
            init: self.parse_hook(HookKind::Init)?,
            uninit: self.parse_hook(HookKind::Uninit)?,
            rx: self.parse_table(Lane::Rx.table_prefix())?,
            tx: self.parse_table(Lane::Tx.table_prefix())?,
        })
    }

    /// Parse a hook if its node exists
    pub fn parse_hook(&self, kind: HookKind) -> Result<Option<BandSetting>, ConfigError> {
        let Some(node) = self.root.child(kind.node_name()) else {
            return Ok(None);
        };
        debug!("Found '{}'", node.name());
        let values = self.parse_line_values(node).inspect_err(|e| {
            error!("Error while parsing '{}': {}", node.name(), e);
        })?;
        Ok(Some(BandSetting::hook(node.name(), values)))
    }

    /// Parse the table of entries named `<prefix><index>`
    ///
    /// Entries are counted first, then parsed; the two passes must agree.
    pub fn parse_table(&self, prefix: &str) -> Result<Vec<BandSetting>, ConfigError> {
        let counted = self.count_entries(prefix, MAX_SETTINGS);
        if counted == 0 {
            return Ok(Vec::new());
        }

        let table = self.scan_entries(prefix, counted)?;
        if table.len() != counted {
            return Err(ConfigError::CountMismatch {
                prefix: prefix.to_string(),
                counted,
                parsed: table.len(),
            });
        }
        Ok(table)
    }

    fn count_entries(&self, prefix: &str, max: usize) -> usize {
        (0..max)
            .take_while(|i| self.root.child(&format!("{}{}", prefix, i)).is_some())
            .count()
    }

    fn scan_entries(&self, prefix: &str, max: usize) -> Result<Vec<BandSetting>, ConfigError> {
        let mut table = Vec::with_capacity(max);
        for i in 0..max {
            let Some(node) = self.root.child(&format!("{}{}", prefix, i)) else {
                break;
            };
            debug!("Found '{}'", node.name());
            let setting = self.parse_ranged(node).inspect_err(|e| {
                error!("Error while parsing '{}': {}", node.name(), e);
            })?;
            table.push(setting);
        }
        Ok(table)
    }

    fn parse_ranged(&self, node: &C) -> Result<BandSetting, ConfigError> {
        let min = read_required_u64(node, PROP_FREQ_MIN)?;
        let max = read_required_u64(node, PROP_FREQ_MAX)?;
        if min > max {
            return Err(ConfigError::InvertedRange {
                entry: node.name().to_string(),
                min,
                max,
            });
        }
        let range = FreqRange::new(min, max);
        debug!(" * frequency range {}", range);

        let values = self.parse_line_values(node)?;
        Ok(BandSetting::ranged(node.name(), range, values))
    }

    /// Absent or empty settings mean the entry changes no lines
    fn parse_line_values(&self, node: &C) -> Result<Option<LineValues>, ConfigError> {
        let codes = node
            .read_u32_array(PROP_LINE_SETTINGS)
            .map_err(|e| invalid_property(node, PROP_LINE_SETTINGS, e))?;

        let codes = match codes {
            None => return Ok(None),
            Some(codes) if codes.is_empty() => return Ok(None),
            Some(codes) => codes,
        };

        if codes.len() != self.line_count {
            return Err(ConfigError::SettingsLength {
                entry: node.name().to_string(),
                expected: self.line_count,
                found: codes.len(),
            });
        }

        let values = LineValues::from_codes(node.name(), &codes)?;
        debug!(" * line settings: {}", values);
        Ok(Some(values))
    }
}

fn read_required_u64<C: ConfigNode>(node: &C, key: &str) -> Result<u64, ConfigError> {
    node.read_u64(key)
        .map_err(|e| invalid_property(node, key, e))?
        .ok_or_else(|| ConfigError::MissingProperty {
            entry: node.name().to_string(),
            property: key.to_string(),
        })
}

fn invalid_property<C: ConfigNode>(node: &C, key: &str, source: PropertyError) -> ConfigError {
    ConfigError::InvalidProperty {
        entry: node.name().to_string(),
        property: key.to_string(),
        source,
    }
}
