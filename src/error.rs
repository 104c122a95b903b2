// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.3
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! Error taxonomy surfaced to the governor.

use dmc_sip::ChannelError;

use crate::status::CounterUnavailable;

/// Failures reported by the controller's governor-facing operations.
///
/// None of these are retried internally; the governor's polling cadence is
/// the retry mechanism. `StaleRateAfterSuccess` additionally flips the
/// controller into its terminal monitor-only mode.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControlError {
    /// No shared command page could be obtained; the instance is
    /// monitor-only for its whole lifetime.
    #[error("firmware command channel unavailable")]
    ChannelUnavailable,
    /// The round-trip validation did not echo the requested rate.
    #[error("firmware rejected {requested} Hz (round-rate returned {rounded})")]
    ValidationRejected {
        /// Rate the governor asked for.
        requested: u32,
        /// Rate firmware said it would use instead (0 = rejected outright).
        rounded: u32,
    },
    /// The cross-subsystem exclusive gate could not be acquired.
    #[error("exclusive controller gate could not be acquired")]
    ResourceBlockFailed,
    /// The set-rate call returned a non-zero generic status.
    #[error("set-rate call failed (status {status})")]
    FirmwareCallFailed {
        /// Raw status word from firmware.
        status: i64,
    },
    /// Firmware reported a handshake-wait timeout even though both
    /// handshake flags are forced to zero. A contract mismatch, not a
    /// transient condition.
    #[error("firmware timed out awaiting a handshake that is never signalled")]
    FirmwareTimeout,
    /// Commit reported success but the observable rate did not move.
    /// Scaling is permanently disabled when this is raised.
    #[error("set-rate reported success but the rate stayed at {hz} Hz")]
    StaleRateAfterSuccess {
        /// The unchanged confirmed rate.
        hz: u32,
    },
    /// The bandwidth counter device failed.
    #[error("bandwidth counter device unavailable")]
    CounterUnavailable,
    /// The running rate could not be determined at initialization, neither
    /// from firmware nor from the fallback clock source.
    #[error("cannot determine the running DDR rate")]
    UnknownRate,
}

impl From<ChannelError> for ControlError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Unavailable(_) | ChannelError::MapFailed { .. } => {
                Self::ChannelUnavailable
            }
            ChannelError::CallFailed(status) => Self::FirmwareCallFailed { status },
            ChannelError::HandshakeTimeout => Self::FirmwareTimeout,
        }
    }
}

impl From<CounterUnavailable> for ControlError {
    fn from(_: CounterUnavailable) -> Self {
        Self::CounterUnavailable
    }
}
