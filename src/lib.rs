// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.7
// Date Modified: 2027-02-18
// Author: Lukas Bower

//! Firmware-mediated DDR frequency controller.
//!
//! The actual clock switching lives in trusted firmware, reachable only
//! through a synchronous SIP call interface and a small shared command
//! page (the `dmc-sip` crate). This crate layers policy on top: an
//! operating-point catalog built from firmware-validated candidates, a
//! transition sequence that validates before it mutates and degrades on
//! anomaly, and the façade a demand governor polls for load and drives
//! with target rates.

/// Operating-point catalog and rate-selection flags.
pub mod catalog;

/// Controller configuration.
pub mod config;

/// Governor-facing controller façade.
pub mod controller;

/// Error taxonomy.
pub mod error;

/// Cross-subsystem exclusive-access gate interface.
pub mod gate;

/// Architecture conduits and the volatile command-page accessor.
pub mod hal;

/// Bandwidth status sampling.
pub mod status;

mod transition;

pub use catalog::{Catalog, OperatingPoint, TransitionFlags};
pub use config::{ConfigError, DmcConfig};
pub use controller::{ClockSource, DeviceProfile, DeviceStatus, DmcController};
pub use error::ControlError;
pub use gate::{GateBusy, TransitionGate};
pub use status::{BandwidthCounter, BandwidthSample, CounterUnavailable, StatusReporter};

pub use dmc_sip;
