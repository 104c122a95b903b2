// CLASSIFICATION: COMMUNITY
// Filename: catalog.rs v0.4
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! Operating-point catalog built from firmware-validated candidates.
//!
//! The catalog is constructed once during initialization and never mutated
//! afterwards; there is deliberately no API for removing entries.

use dmc_sip::{Channel, Firmware};

bitflags::bitflags! {
    /// Rate-selection flags passed by the governor alongside a target rate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransitionFlags: u32 {
        /// Treat the target as an upper bound: pick the highest catalog
        /// rate at or below it instead of the lowest at or above it.
        const LEAST_UPPER_BOUND = 1 << 0;
    }
}

/// A firmware-validated (frequency, voltage-hint) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingPoint {
    hz: u32,
    microvolt: u32,
}

impl OperatingPoint {
    /// Construct an operating point.
    #[must_use]
    pub fn new(hz: u32, microvolt: u32) -> Self {
        Self { hz, microvolt }
    }

    /// Frequency in Hz.
    #[must_use]
    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// Voltage hint in microvolts.
    #[must_use]
    pub fn microvolt(&self) -> u32 {
        self.microvolt
    }
}

/// Ordered set of operating points, strictly increasing in frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    points: Vec<OperatingPoint>,
}

impl Catalog {
    /// Validate `candidates` against firmware and keep the exact matches.
    ///
    /// A candidate survives only when the round-trip result equals it
    /// bit-for-bit; firmware rounding is not tolerated. Candidates that
    /// would break the strictly-increasing order are dropped.
    pub fn probe<F: Firmware>(
        channel: &mut Channel<F>,
        candidates: &[u32],
        microvolt: u32,
    ) -> Self {
        let mut points: Vec<OperatingPoint> = Vec::with_capacity(candidates.len());
        for &hz in candidates {
            let rounded = channel.round_trip(hz);
            if rounded != hz {
                log::info!(
                    "rate {} MHz not supported by firmware (round-rate {rounded})",
                    hz / 1_000_000
                );
                continue;
            }
            if points.last().is_some_and(|last| last.hz() >= hz) {
                continue;
            }
            points.push(OperatingPoint::new(hz, microvolt));
        }
        log::info!("validated {} operating points", points.len());
        Self { points }
    }

    /// Single-entry catalog for monitor-only operation.
    #[must_use]
    pub fn fallback(current_hz: u32, microvolt: u32) -> Self {
        Self {
            points: vec![OperatingPoint::new(current_hz, microvolt)],
        }
    }

    /// All operating points, lowest frequency first.
    #[must_use]
    pub fn points(&self) -> &[OperatingPoint] {
        &self.points
    }

    /// Number of operating points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the catalog holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether `hz` is a catalog frequency.
    #[must_use]
    pub fn contains(&self, hz: u32) -> bool {
        self.points.iter().any(|point| point.hz() == hz)
    }

    /// Map a requested rate onto a catalog entry.
    ///
    /// Default policy picks the lowest frequency at or above the target,
    /// clamping to the highest entry when the target exceeds the table.
    /// With [`TransitionFlags::LEAST_UPPER_BOUND`] the policy inverts:
    /// highest at or below the target, clamped to the lowest entry.
    #[must_use]
    pub fn select(&self, target_hz: u32, flags: TransitionFlags) -> Option<OperatingPoint> {
        if flags.contains(TransitionFlags::LEAST_UPPER_BOUND) {
            self.points
                .iter()
                .rev()
                .find(|point| point.hz() <= target_hz)
                .or_else(|| self.points.first())
                .copied()
        } else {
            self.points
                .iter()
                .find(|point| point.hz() >= target_hz)
                .or_else(|| self.points.last())
                .copied()
        }
    }
}
