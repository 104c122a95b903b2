// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · HAL facade v0.3
// Date Modified: 2027-02-18
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// ddrfreq · Hardware-Abstraction Layer (facade)
//
// Exports the architecture-specific firmware conduits selected at
// compile-time via `cfg`, plus the one piece of hardware access that is
// architecture-neutral: volatile word access to the mapped command page.
//
//   • `hal::arm64` – SMCCC conduit for aarch64 targets
//
// Higher layers depend only on the `dmc_sip::Firmware` and
// `dmc_sip::PageAccess` seams; everything `unsafe` lives below this
// facade.
// ─────────────────────────────────────────────────────────────

#![allow(unsafe_code)]

use core::ptr::NonNull;
use core::sync::atomic::{fence, Ordering};

use dmc_sip::{page, PageAccess};

/// SMCCC implementation – selected when compiling for `aarch64`.
#[cfg(target_arch = "aarch64")]
pub mod arm64;

/// Volatile word access to the firmware-mapped command page.
///
/// Writes are ordered: each store is followed by a full fence so the word
/// is globally visible before any subsequent firmware call, and each load
/// is preceded by one so read-backs observe the call's effects.
pub struct MappedPage {
    base: NonNull<u32>,
}

// The page is exclusively owned by the channel holding it; firmware only
// touches it inside a synchronous call, never concurrently with the owner.
unsafe impl Send for MappedPage {}

impl MappedPage {
    /// Wrap a mapped command page.
    ///
    /// # Safety
    ///
    /// `base` must point at the start of the mapped page and stay valid for
    /// volatile reads and writes of at least [`page::REGION_LEN`] bytes for
    /// the lifetime of this value.
    #[must_use]
    pub unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }
}

impl PageAccess for MappedPage {
    fn write_word(&mut self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0 && offset < page::REGION_LEN);
        // SAFETY: in bounds per the constructor contract.
        unsafe { self.base.as_ptr().add(offset / 4).write_volatile(value) };
        fence(Ordering::SeqCst);
    }

    fn read_word(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0 && offset < page::REGION_LEN);
        fence(Ordering::SeqCst);
        // SAFETY: in bounds per the constructor contract.
        unsafe { self.base.as_ptr().add(offset / 4).read_volatile() }
    }
}
