// CLASSIFICATION: COMMUNITY
// Filename: transition.rs v0.5
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! The frequency-change sequence: validate, block, commit, confirm.
//!
//! Ordering is strict. Validation happens before anything is blocked or
//! mutated, the exclusive gate is held only around the commit and the
//! read-back, and the gate is released on every exit path.

use dmc_sip::{Channel, Firmware};

use crate::error::ControlError;
use crate::gate::TransitionGate;

/// RAII hold on the exclusive gate.
struct GateHold<'a, G: TransitionGate>(&'a G);

impl<'a, G: TransitionGate> GateHold<'a, G> {
    fn acquire(gate: &'a G) -> Result<Self, ControlError> {
        gate.block().map_err(|_| ControlError::ResourceBlockFailed)?;
        Ok(Self(gate))
    }
}

impl<G: TransitionGate> Drop for GateHold<'_, G> {
    fn drop(&mut self) {
        self.0.unblock();
    }
}

/// Run one transition from `old_hz` to `target_hz` and return the newly
/// confirmed rate.
///
/// The caller holds the controller's serialization lock and has already
/// handled the idempotent and monitor-only cases. On
/// [`ControlError::StaleRateAfterSuccess`] the caller must disable scaling
/// for the remainder of the controller's lifetime.
pub(crate) fn run<F, G>(
    channel: &mut Channel<F>,
    gate: &G,
    old_hz: u32,
    target_hz: u32,
) -> Result<u32, ControlError>
where
    F: Firmware,
    G: TransitionGate,
{
    let rounded = channel.round_trip(target_hz);
    if rounded != target_hz {
        log::debug!("firmware rejected {target_hz} Hz (round-rate {rounded})");
        return Err(ControlError::ValidationRejected {
            requested: target_hz,
            rounded,
        });
    }

    let hold = GateHold::acquire(gate)?;
    channel.commit(target_hz)?;
    let read_back = channel.read_current();
    drop(hold);

    let confirmed = if read_back != 0 { read_back } else { old_hz };
    if confirmed == old_hz && target_hz != old_hz {
        return Err(ControlError::StaleRateAfterSuccess { hz: old_hz });
    }
    Ok(confirmed)
}
