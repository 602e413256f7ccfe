//! Band controller
//!
//! Combines the line bank, both settings tables and the lifecycle hooks, and
//! tracks which setting is currently asserted on each lane. Each lane moves
//! from "unset" to "applied(setting)" and only ever changes on a successful
//! apply.
//!
//! # Differential apply
//!
//! Applying a setting walks the lines in index order and skips any line
//! whose target equals the previous setting's target for that line, as
//! well as lines whose target is [`LineOp::NoOp`]. The first driver failure
//! stops the walk: lines already written keep their new state and the rest
//! keep their old one. There is no rollback, so after a failure the lane is
//! in a mixed state and the caller should retry the whole setting.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::config::ConfigNode;
use crate::error::{BandError, ConfigError};
use crate::line::{LineBank, LineDriver, LineOp};
use crate::loader::{count_lines, line_name, BandTables, ConfigLoader};
use crate::selector::BandSelector;
use crate::setting::{BandSetting, Frequency, HookKind, Lane, SettingId};

/// What a frequency change did to a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No table entry covers the frequency; current lines stay asserted
    NoMatch,
    /// The selected entry is already applied; no lines were touched
    Unchanged,
    /// The selected entry was applied and is now current
    Applied(SettingId),
}

struct ControlState<D: LineDriver> {
    bank: LineBank<D>,
    rx_current: Option<SettingId>,
    tx_current: Option<SettingId>,
}

impl<D: LineDriver> ControlState<D> {
    fn current(&self, lane: Lane) -> Option<SettingId> {
        match lane {
            Lane::Rx => self.rx_current,
            Lane::Tx => self.tx_current,
        }
    }

    fn set_current(&mut self, lane: Lane, id: SettingId) {
        match lane {
            Lane::Rx => self.rx_current = Some(id),
            Lane::Tx => self.tx_current = Some(id),
        }
    }
}

/// Frequency-driven controller for an external band-switching line bank
///
/// All methods take `&self`. The line bank and both lane pointers sit behind
/// a single lock, since both lanes may target the same lines. The controller
/// is `Send + Sync` when both `D` and `D::Line` are `Send`.
pub struct BandController<D: LineDriver> {
    tables: BandTables,
    state: Mutex<ControlState<D>>,
}

impl<D: LineDriver> BandController<D> {
    /// Build a controller from configuration and apply the init hook
    ///
    /// Returns `Ok(None)` when no control lines are declared: the feature is
    /// simply absent. Every table is parsed and validated before any line is
    /// driven; a failing init hook fails registration.
    pub fn register<C: ConfigNode>(root: &C, driver: D) -> Result<Option<Self>, BandError> {
        let line_count = count_lines(root);
        if line_count == 0 {
            info!("No control lines defined for external band control");
            return Ok(None);
        }

        let bank = LineBank::acquire(driver, (0..line_count).map(line_name))?;
        let tables = ConfigLoader::new(root, line_count).load()?;
        let controller = Self::new(bank, tables)?;
        controller.init()?;

        let hooks: Vec<_> = controller.tables.hooks().map(|kind| kind.node_name()).collect();
        info!(
            "External band control registered: {} lines, {} rx / {} tx settings, hooks: [{}]",
            line_count,
            controller.tables.rx.len(),
            controller.tables.tx.len(),
            hooks.join(", ")
        );
        Ok(Some(controller))
    }

    /// Assemble a controller from an acquired bank and parsed tables
    ///
    /// Both lanes start unset; nothing is driven. Fails if any setting's
    /// line targets do not cover exactly the bank's lines.
    pub fn new(bank: LineBank<D>, tables: BandTables) -> Result<Self, ConfigError> {
        let expected = bank.count();
        let all = tables
            .init
            .iter()
            .chain(tables.uninit.iter())
            .chain(tables.rx.iter())
            .chain(tables.tx.iter());
        for setting in all {
            if let Some(values) = setting.values() {
                if values.len() != expected {
                    return Err(ConfigError::SettingsLength {
                        entry: setting.name().to_string(),
                        expected,
                        found: values.len(),
                    });
                }
            }
        }

        Ok(Self {
            tables,
            state: Mutex::new(ControlState {
                bank,
                rx_current: None,
                tx_current: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ControlState<D>> {
        // Lane pointers are swapped whole, never left half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the init hook unconditionally, if configured
    ///
    /// Every non-no-op line is written. On success both lanes start from the
    /// init hook.
    pub fn init(&self) -> Result<(), BandError> {
        let Some(hook) = self.tables.init.as_ref() else {
            return Ok(());
        };

        let mut state = self.lock();
        apply_setting(&mut state.bank, hook, None)?;
        let id = SettingId::Hook(HookKind::Init);
        state.set_current(Lane::Rx, id);
        state.set_current(Lane::Tx, id);
        Ok(())
    }

    /// Apply the uninit hook once, best effort
    ///
    /// Failures are logged and otherwise ignored. Lane pointers are not
    /// changed.
    pub fn uninit(&self) {
        let Some(hook) = self.tables.uninit.as_ref() else {
            return;
        };

        let mut state = self.lock();
        if let Err(e) = apply_setting(&mut state.bank, hook, None) {
            warn!("Uninit setting '{}' failed: {}", hook.name(), e);
        }
    }

    /// Apply the uninit hook and release the line bank
    ///
    /// Returns the driver so the owner can reuse or inspect it.
    pub fn teardown(self) -> D {
        self.uninit();
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        state.bank.into_driver()
    }

    /// React to a new local-oscillator frequency on `lane`
    ///
    /// Selects the first table entry covering `freq` and applies it unless
    /// it is already current. On failure the lane keeps its previous
    /// current setting and the hardware error is returned.
    pub fn on_frequency_change(
        &self,
        lane: Lane,
        freq: Frequency,
    ) -> Result<ApplyOutcome, BandError> {
        let table = self.tables.table(lane);
        let Some(index) = BandSelector::select_index(table, freq) else {
            return Ok(ApplyOutcome::NoMatch);
        };
        let target = SettingId::Table(lane, index);

        let mut state = self.lock();
        let current = state.current(lane);
        if current == Some(target) {
            return Ok(ApplyOutcome::Unchanged);
        }

        let previous = current.and_then(|id| self.setting(id));
        apply_setting(&mut state.bank, &table[index], previous)?;
        state.set_current(lane, target);
        Ok(ApplyOutcome::Applied(target))
    }

    pub fn on_rx_frequency_change(&self, freq: Frequency) -> Result<ApplyOutcome, BandError> {
        self.on_frequency_change(Lane::Rx, freq)
    }

    pub fn on_tx_frequency_change(&self, freq: Frequency) -> Result<ApplyOutcome, BandError> {
        self.on_frequency_change(Lane::Tx, freq)
    }

    /// Number of control lines
    pub fn line_count(&self) -> usize {
        self.lock().bank.count()
    }

    /// The ordered settings table for `lane`
    pub fn settings(&self, lane: Lane) -> &[BandSetting] {
        self.tables.table(lane)
    }

    pub fn hook(&self, kind: HookKind) -> Option<&BandSetting> {
        self.tables.hook(kind)
    }

    /// Resolve a setting id
    pub fn setting(&self, id: SettingId) -> Option<&BandSetting> {
        match id {
            SettingId::Hook(kind) => self.tables.hook(kind),
            SettingId::Table(lane, index) => self.tables.table(lane).get(index),
        }
    }

    /// Id of the setting currently asserted on `lane`
    pub fn current(&self, lane: Lane) -> Option<SettingId> {
        self.lock().current(lane)
    }

    /// The setting currently asserted on `lane`
    pub fn current_setting(&self, lane: Lane) -> Option<&BandSetting> {
        self.current(lane).and_then(|id| self.setting(id))
    }
}

impl<D: LineDriver> fmt::Debug for BandController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandController")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

/// Drive the lines that differ between `previous` and `new`
///
/// Returns the number of line writes performed.
fn apply_setting<D: LineDriver>(
    bank: &mut LineBank<D>,
    new: &BandSetting,
    previous: Option<&BandSetting>,
) -> Result<usize, BandError> {
    debug!("Applying setting '{}'", new.name());

    let Some(values) = new.values() else {
        debug!("Setting '{}' changes no lines", new.name());
        return Ok(0);
    };
    let previous = previous.and_then(BandSetting::values);

    let mut writes = 0;
    for line in 0..bank.count() {
        let op = values.get(line).unwrap_or_default();
        if previous.and_then(|p| p.get(line)) == Some(op) {
            continue;
        }
        if op == LineOp::NoOp {
            continue;
        }

        bank.set(line, op).map_err(|source| {
            error!("Error setting line {} to {}: {}", line, op, source);
            BandError::Hardware {
                setting: new.name().to_string(),
                line,
                source,
            }
        })?;
        debug!("Line {} set to {}", line, op);
        writes += 1;
    }

    debug!("Applied setting '{}' ({} line writes)", new.name(), writes);
    Ok(writes)
}
