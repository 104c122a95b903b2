// Copyright © 2027 Lukas Bower
// SPDX-License-Identifier: MIT
// Purpose: Provide the SIP command-page protocol client for DDR frequency control.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Wire-level client for the trusted-firmware DDR frequency interface.
//!
//! The firmware exposes two SIP functions: one allocates a shared command
//! page, the other drives the DDR state machine through sub-commands that
//! read their parameters from that page. All calls are synchronous and block
//! the caller until firmware returns. This crate owns the bit-exact page
//! layout and the call discipline; policy (which rate to pick, when to
//! degrade) lives with the controller that consumes [`Channel`].

/// SIP function identifier for DDR frequency control.
pub const SIP_DRAM_FREQ: u32 = 0x8200_0008;

/// SIP function identifier for shared command-page allocation.
pub const SIP_SHARE_MEM: u32 = 0x8200_0009;

/// Shared-page type tag identifying the DDR command page.
pub const SHARE_PAGE_TYPE_DDR: u64 = 2;

/// Detail code firmware reports in the second result word when a set-rate
/// call waited on a handshake flag that was never raised.
pub const HANDSHAKE_TIMEOUT_DETAIL: i32 = -6;

/// Sub-commands accepted by [`SIP_DRAM_FREQ`], passed in the third argument
/// word.
///
/// `Init` and `SetAtSelfRefresh` are part of the firmware interface but are
/// never issued by [`Channel`]; they are kept so the constant table matches
/// the firmware side in full.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DramCmd {
    /// Initialize the firmware DDR scaling state machine.
    Init = 0,
    /// Commit the rate currently written to the command page.
    SetRate = 1,
    /// Report the rate firmware would use for the page's candidate.
    RoundRate = 2,
    /// Adjust behaviour while DRAM sits in self-refresh.
    SetAtSelfRefresh = 3,
    /// Report the firmware interface version.
    GetVersion = 4,
    /// Report the currently running DDR rate.
    GetRate = 5,
}

/// Byte offsets of the 32-bit little-endian fields in the command page.
///
/// The defined region is 36 bytes at the start of the page. Firmware reads
/// the rate and flag fields before performing a rate change; the completion
/// field is firmware-written and never touched from this side.
pub mod page {
    /// Target frequency in Hz.
    pub const HZ: usize = 0;
    /// Display-type tag; always written 0 (no display synchronization).
    pub const DISPLAY_TYPE: usize = 4;
    /// Reserved legacy field; always written 0.
    pub const VOP: usize = 8;
    /// Reserved legacy field; always written 0.
    pub const VOP_MODE: usize = 12;
    /// Self-refresh-idle enable; always written 0.
    pub const SR_IDLE_EN: usize = 16;
    /// Reserved address field; always written 0.
    pub const MCU_ADDR: usize = 20;
    /// First handshake flag; always written 0 so firmware never waits.
    pub const WAIT_FLAG_A: usize = 24;
    /// Second handshake flag; always written 0 so firmware never waits.
    pub const WAIT_FLAG_B: usize = 28;
    /// Completion notification word, written by firmware only.
    pub const COMPLETE_IRQ: usize = 32;
    /// Length of the defined region in bytes.
    pub const REGION_LEN: usize = 36;
}

/// Result words of a firmware call: status in `a0`, payload in `a1`..`a3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SipResult {
    /// Status word; zero means success.
    pub a0: u64,
    /// First payload word.
    pub a1: u64,
    /// Second payload word.
    pub a2: u64,
    /// Third payload word.
    pub a3: u64,
}

impl SipResult {
    /// Construct a result from the four returned words.
    #[must_use]
    pub fn new(a0: u64, a1: u64, a2: u64, a3: u64) -> Self {
        Self { a0, a1, a2, a3 }
    }

    /// Whether the call reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.a0 == 0
    }
}

/// Word-granular access to the mapped command page.
///
/// Implementations over real hardware must use volatile stores and loads:
/// a write must be globally visible before any subsequent [`Firmware::call`]
/// is issued, and a read after a call must observe the call's effects.
pub trait PageAccess {
    /// Store a 32-bit word at the given byte offset.
    fn write_word(&mut self, offset: usize, value: u32);
    /// Load the 32-bit word at the given byte offset.
    fn read_word(&self, offset: usize) -> u32;
}

/// Synchronous conduit into trusted firmware.
///
/// `call` takes a function identifier plus up to seven argument words and
/// blocks until firmware hands back four result words. `map_shared` turns a
/// firmware-provided physical page address into a [`PageAccess`] handle;
/// how the translation happens is environment-specific.
pub trait Firmware {
    /// Issue a synchronous firmware call.
    fn call(&self, function: u32, args: [u64; 7]) -> SipResult;

    /// Map the shared command page firmware allocated at `phys`.
    fn map_shared(&self, phys: u64) -> Result<Box<dyn PageAccess + Send>, ChannelError>;
}

/// Errors surfaced by the command channel.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChannelError {
    /// Firmware declined to allocate a shared command page.
    #[error("firmware declined the shared command page (status {0})")]
    Unavailable(i64),
    /// The allocated page could not be mapped into this address space.
    #[error("cannot map shared command page at {phys:#x}")]
    MapFailed {
        /// Physical address firmware reported for the page.
        phys: u64,
    },
    /// A set-rate call returned a non-zero generic status.
    #[error("set-rate call failed (status {0})")]
    CallFailed(i64),
    /// Firmware waited on a handshake flag this channel never raises.
    ///
    /// The flags are forced to zero on every commit, so this status means
    /// the firmware contract does not match; it is reported, never retried.
    #[error("firmware timed out awaiting a handshake that is never signalled")]
    HandshakeTimeout,
}

fn dram_args(cmd: DramCmd) -> [u64; 7] {
    [SHARE_PAGE_TYPE_DDR, 0, cmd as u64, 0, 0, 0, 0]
}

/// Client for the firmware command page, one per physical controller.
///
/// The channel exclusively owns the mapped page; callers serialize access
/// externally so at most one writer exists at a time.
pub struct Channel<F: Firmware> {
    firmware: F,
    page: Box<dyn PageAccess + Send>,
    phys: u64,
}

impl<F: Firmware> std::fmt::Debug for Channel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

impl<F: Firmware> Channel<F> {
    /// Request a shared command page from firmware and map it.
    ///
    /// Failure here is permanent for the controller instance: without a page
    /// there is no way to pass rate parameters, so the caller must run in
    /// monitor-only mode.
    pub fn open(firmware: F) -> Result<Self, ChannelError> {
        let res = firmware.call(SIP_SHARE_MEM, [1, SHARE_PAGE_TYPE_DDR, 0, 0, 0, 0, 0]);
        if !res.is_ok() {
            log::warn!(
                "firmware declined the shared command page (status {:#x})",
                res.a0
            );
            return Err(ChannelError::Unavailable(res.a0 as i64));
        }
        let phys = res.a1;
        let page = firmware.map_shared(phys)?;
        log::info!("firmware command page at {phys:#x}");
        Ok(Self {
            firmware,
            page,
            phys,
        })
    }

    /// Physical address of the command page, as reported by firmware.
    #[must_use]
    pub fn page_phys(&self) -> u64 {
        self.phys
    }

    /// Query the firmware interface version. Informational; failure is
    /// non-fatal.
    pub fn query_version(&self) -> Option<u64> {
        let res = self
            .firmware
            .call(SIP_DRAM_FREQ, [0, 0, DramCmd::GetVersion as u64, 0, 0, 0, 0]);
        res.is_ok().then_some(res.a1)
    }

    /// Ask firmware which rate it would actually use for `hz`.
    ///
    /// Returns 0 when the candidate is rejected. Has no effect on the
    /// running clock.
    pub fn round_trip(&mut self, hz: u32) -> u32 {
        self.page.write_word(page::HZ, hz);
        let res = self.firmware.call(SIP_DRAM_FREQ, dram_args(DramCmd::RoundRate));
        if res.is_ok() {
            res.a1 as u32
        } else {
            log::debug!("round-rate call for {hz} Hz failed (status {:#x})", res.a0);
            0
        }
    }

    /// Commit `hz` as the new DDR rate.
    ///
    /// Every control field besides the rate is forced to zero, in
    /// particular both handshake flags: firmware must perform the change
    /// immediately instead of waiting for an external readiness signal.
    pub fn commit(&mut self, hz: u32) -> Result<(), ChannelError> {
        self.page.write_word(page::HZ, hz);
        self.page.write_word(page::DISPLAY_TYPE, 0);
        self.page.write_word(page::VOP, 0);
        self.page.write_word(page::VOP_MODE, 0);
        self.page.write_word(page::SR_IDLE_EN, 0);
        self.page.write_word(page::MCU_ADDR, 0);
        self.page.write_word(page::WAIT_FLAG_A, 0);
        self.page.write_word(page::WAIT_FLAG_B, 0);
        let res = self.firmware.call(SIP_DRAM_FREQ, dram_args(DramCmd::SetRate));
        if res.is_ok() {
            return Ok(());
        }
        if res.a1 as i32 == HANDSHAKE_TIMEOUT_DETAIL {
            log::error!("set-rate for {hz} Hz hit a handshake wait with both flags at 0");
            return Err(ChannelError::HandshakeTimeout);
        }
        log::warn!("set-rate for {hz} Hz failed (status {:#x})", res.a0);
        Err(ChannelError::CallFailed(res.a0 as i64))
    }

    /// Read the currently running DDR rate. Returns 0 when firmware reports
    /// failure.
    pub fn read_current(&self) -> u32 {
        let res = self.firmware.call(SIP_DRAM_FREQ, dram_args(DramCmd::GetRate));
        if res.is_ok() {
            res.a1 as u32
        } else {
            0
        }
    }
}
