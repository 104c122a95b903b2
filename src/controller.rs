// CLASSIFICATION: COMMUNITY
// Filename: controller.rs v0.6
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! Controller façade presented to the demand governor.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use dmc_sip::{Channel, Firmware};

use crate::catalog::{Catalog, TransitionFlags};
use crate::config::DmcConfig;
use crate::error::ControlError;
use crate::gate::TransitionGate;
use crate::status::{BandwidthCounter, BandwidthSample, StatusReporter};
use crate::transition;

/// Read-only clock source consulted as a last resort when firmware cannot
/// report the running rate.
pub trait ClockSource {
    /// Current rate in Hz, if known.
    fn rate(&self) -> Option<u32>;
}

/// Snapshot returned to the governor's status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Last confirmed DDR rate in Hz.
    pub current_hz: u32,
    /// Bandwidth sample for the elapsed window.
    pub sample: BandwidthSample,
}

/// Callback profile the external governor drives.
pub trait DeviceProfile {
    /// Request a new target rate; returns the rate actually confirmed.
    fn target(&self, target_hz: u32, flags: TransitionFlags) -> Result<u32, ControlError>;
    /// Report the confirmed rate together with a bandwidth sample.
    fn device_status(&self) -> Result<DeviceStatus, ControlError>;
    /// Report the confirmed rate.
    fn current_frequency(&self) -> u32;
}

/// Firmware-mediated DDR frequency controller.
///
/// One instance per physical memory controller. All transitions serialize
/// behind a single lock that also owns the command page; status reads go
/// through atomics and never wait on an in-flight transition.
pub struct DmcController<F: Firmware, C: BandwidthCounter, G: TransitionGate> {
    channel: Mutex<Option<Channel<F>>>,
    catalog: Catalog,
    reporter: StatusReporter<C>,
    gate: G,
    confirmed_hz: AtomicU32,
    scaling_enabled: AtomicBool,
}

impl<F: Firmware, C: BandwidthCounter, G: TransitionGate> std::fmt::Debug for DmcController<F, C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmcController").finish_non_exhaustive()
    }
}

impl<F: Firmware, C: BandwidthCounter, G: TransitionGate> DmcController<F, C, G> {
    /// Bring the controller up.
    ///
    /// A missing command channel is not fatal: the instance then runs
    /// monitor-only for its whole lifetime, reporting the rate discovered
    /// through `fallback_clock`. An unknown running rate is fatal.
    pub fn new(
        firmware: F,
        counter: C,
        gate: G,
        config: &DmcConfig,
        fallback_clock: Option<&dyn ClockSource>,
    ) -> Result<Self, ControlError> {
        let reporter = StatusReporter::new(counter);
        reporter.enable()?;

        let mut channel = match Channel::open(firmware) {
            Ok(channel) => Some(channel),
            Err(err) => {
                log::warn!("monitor-only mode: {err}");
                None
            }
        };

        if let Some(chan) = channel.as_ref() {
            match chan.query_version() {
                Some(version) => log::info!("DDR scaling firmware version {version:#x}"),
                None => log::debug!("firmware version query failed"),
            }
        }

        let mut rate = channel.as_ref().map_or(0, Channel::read_current);
        if rate == 0 {
            rate = fallback_clock.and_then(ClockSource::rate).unwrap_or(0);
        }
        if rate == 0 {
            log::error!("cannot determine the running DDR rate");
            return Err(ControlError::UnknownRate);
        }

        let (catalog, scaling) = match channel.as_mut() {
            Some(chan) => {
                let probed = Catalog::probe(chan, &config.candidates_hz, config.opp_microvolt);
                if probed.is_empty() {
                    log::warn!("no candidate rate validated, scaling disabled");
                    (Catalog::fallback(rate, config.opp_microvolt), false)
                } else {
                    (probed, true)
                }
            }
            None => (Catalog::fallback(rate, config.opp_microvolt), false),
        };

        log::info!(
            "DDR frequency controller ready: {} MHz, {}",
            rate / 1_000_000,
            if scaling { "scaling enabled" } else { "monitor-only" }
        );

        Ok(Self {
            channel: Mutex::new(channel),
            catalog,
            reporter,
            gate,
            confirmed_hz: AtomicU32::new(rate),
            scaling_enabled: AtomicBool::new(scaling),
        })
    }

    /// Ask for a new target rate.
    ///
    /// The request is first mapped onto the catalog, then committed through
    /// the validate → block → commit → confirm sequence. Selecting the
    /// already-confirmed rate succeeds without touching firmware, and a
    /// disabled (monitor-only or degraded) controller reports the confirmed
    /// rate unchanged.
    pub fn select_frequency(
        &self,
        target_hz: u32,
        flags: TransitionFlags,
    ) -> Result<u32, ControlError> {
        let Some(point) = self.catalog.select(target_hz, flags) else {
            return Ok(self.current_frequency());
        };
        let target = point.hz();

        let mut guard = self.channel.lock().unwrap();
        let old = self.confirmed_hz.load(Ordering::Acquire);
        if target == old {
            return Ok(old);
        }
        if !self.scaling_enabled.load(Ordering::Acquire) {
            return Ok(old);
        }
        let Some(chan) = guard.as_mut() else {
            return Ok(old);
        };

        match transition::run(chan, &self.gate, old, target) {
            Ok(confirmed) => {
                self.confirmed_hz.store(confirmed, Ordering::Release);
                log::info!(
                    "DDR rate changed: {} -> {} MHz",
                    old / 1_000_000,
                    confirmed / 1_000_000
                );
                Ok(confirmed)
            }
            Err(err @ ControlError::StaleRateAfterSuccess { .. }) => {
                // A stale success would repeat on every poll cycle; stop
                // issuing rate calls for the rest of this lifetime.
                self.scaling_enabled.store(false, Ordering::Release);
                log::warn!("scaling disabled: {err}");
                Err(err)
            }
            Err(err) => {
                log::warn!("transition to {} MHz failed: {err}", target / 1_000_000);
                Err(err)
            }
        }
    }

    /// Confirmed rate plus one bandwidth sample.
    pub fn status(&self) -> Result<DeviceStatus, ControlError> {
        let sample = self.reporter.sample()?;
        Ok(DeviceStatus {
            current_hz: self.current_frequency(),
            sample,
        })
    }

    /// Last confirmed DDR rate in Hz.
    #[must_use]
    pub fn current_frequency(&self) -> u32 {
        self.confirmed_hz.load(Ordering::Acquire)
    }

    /// Whether the controller will still attempt transitions.
    #[must_use]
    pub fn scaling_enabled(&self) -> bool {
        self.scaling_enabled.load(Ordering::Acquire)
    }

    /// The finalized operating-point catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Stop bandwidth monitoring ahead of a system suspend.
    ///
    /// The surrounding framework guarantees no transition is in flight and
    /// pauses the governor's polling; that ordering is a documented
    /// precondition, not enforced here.
    pub fn suspend(&self) -> Result<(), ControlError> {
        self.reporter.disable()?;
        Ok(())
    }

    /// Restart bandwidth monitoring after resume.
    pub fn resume(&self) -> Result<(), ControlError> {
        self.reporter.enable()?;
        Ok(())
    }
}

impl<F: Firmware, C: BandwidthCounter, G: TransitionGate> DeviceProfile
    for DmcController<F, C, G>
{
    fn target(&self, target_hz: u32, flags: TransitionFlags) -> Result<u32, ControlError> {
        self.select_frequency(target_hz, flags)
    }

    fn device_status(&self) -> Result<DeviceStatus, ControlError> {
        self.status()
    }

    fn current_frequency(&self) -> u32 {
        DmcController::current_frequency(self)
    }
}
