// CLASSIFICATION: COMMUNITY
// Filename: gate.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! Cross-subsystem exclusive-access gate guarding the physical controller.

/// Raised when the exclusive gate cannot be acquired.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("exclusive controller gate busy")]
pub struct GateBusy;

/// Mutual-exclusion resource shared with the other consumer of the same
/// physical controller.
///
/// The orchestrator holds the gate through an RAII guard, so every `block`
/// is matched by exactly one `unblock` on every success and failure path.
pub trait TransitionGate {
    /// Acquire exclusive access for the duration of a commit.
    fn block(&self) -> Result<(), GateBusy>;
    /// Release exclusive access.
    fn unblock(&self);
}
