//! Virtual radio PHY
//!
//! Stands in for the transceiver driver that owns the band controller: it
//! registers the controller at attach time, forwards every rx/tx LO change
//! to it, and tears it down on detach.

use band_ctl::{ApplyOutcome, BandController, BandError, ConfigNode, Frequency, LineDriver};
use tracing::info;

use crate::driver::SimLineDriver;

/// A simulated transceiver with optional external band control
#[derive(Debug)]
pub struct VirtualPhy<D: LineDriver = SimLineDriver> {
    id: String,
    rx_lo: Option<Frequency>,
    tx_lo: Option<Frequency>,
    band_ctl: Option<BandController<D>>,
}

impl<D: LineDriver> VirtualPhy<D> {
    /// Attach a PHY, registering band control from `config`
    ///
    /// A configuration without control lines attaches with band control
    /// disabled.
    pub fn attach<C: ConfigNode>(
        id: impl Into<String>,
        config: &C,
        driver: D,
    ) -> Result<Self, BandError> {
        let id = id.into();
        let band_ctl = BandController::register(config, driver)?;
        info!(
            "[{}] attached, external band control {}",
            id,
            if band_ctl.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            id,
            rx_lo: None,
            tx_lo: None,
            band_ctl,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last requested receive LO frequency
    pub fn rx_lo(&self) -> Option<Frequency> {
        self.rx_lo
    }

    /// Last requested transmit LO frequency
    pub fn tx_lo(&self) -> Option<Frequency> {
        self.tx_lo
    }

    /// Tune the receive LO and adjust the front-end
    ///
    /// Returns `Ok(None)` when band control is disabled.
    pub fn set_rx_lo(&mut self, freq: Frequency) -> Result<Option<ApplyOutcome>, BandError> {
        self.rx_lo = Some(freq);
        self.band_ctl
            .as_ref()
            .map(|ctl| ctl.on_rx_frequency_change(freq))
            .transpose()
    }

    /// Tune the transmit LO and adjust the front-end
    ///
    /// Returns `Ok(None)` when band control is disabled.
    pub fn set_tx_lo(&mut self, freq: Frequency) -> Result<Option<ApplyOutcome>, BandError> {
        self.tx_lo = Some(freq);
        self.band_ctl
            .as_ref()
            .map(|ctl| ctl.on_tx_frequency_change(freq))
            .transpose()
    }

    pub fn band_control(&self) -> Option<&BandController<D>> {
        self.band_ctl.as_ref()
    }

    /// Detach, applying the uninit hook if band control is enabled
    pub fn detach(self) -> Option<D> {
        info!("[{}] detached", self.id);
        self.band_ctl.map(BandController::teardown)
    }
}
