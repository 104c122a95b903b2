// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · test doubles v0.3
// Date Modified: 2027-02-18
// Author: Lukas Bower

//! Scriptable doubles for the firmware, the event-counter device, the
//! exclusive gate and the fallback clock. The firmware double shares the
//! command page with the channel under test and samples it at call time,
//! the way real firmware reads its parameters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ddrfreq::controller::ClockSource;
use ddrfreq::dmc_sip::{
    page, ChannelError, DramCmd, Firmware, PageAccess, SipResult, SIP_DRAM_FREQ, SIP_SHARE_MEM,
};
use ddrfreq::gate::{GateBusy, TransitionGate};
use ddrfreq::status::{BandwidthCounter, BandwidthSample, CounterUnavailable};

pub const PHYS: u64 = 0x40_0000;

pub const MHZ: u32 = 1_000_000;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One observed firmware call, by sub-command, with the rate sampled from
/// the shared page where the real firmware would read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    SharePage,
    Version,
    RoundRate(u32),
    SetRate(u32),
    GetRate,
}

#[derive(Debug)]
pub struct FirmwareState {
    /// Status returned for the share-page allocation call.
    pub share_status: u64,
    /// Rate the firmware reports as currently running.
    pub current_hz: u32,
    /// Rates ROUND_RATE echoes back; everything else rounds to 0.
    pub accepted: Vec<u32>,
    /// Overrides checked before `accepted`: ROUND_RATE maps `.0` to `.1`.
    pub rounded: Vec<(u32, u32)>,
    /// (status, detail) words returned from SET_RATE.
    pub set_rate_result: (u64, u64),
    /// Whether a successful SET_RATE actually moves `current_hz`.
    pub apply_set_rate: bool,
    /// Force GET_RATE to report failure.
    pub get_rate_fail: bool,
    /// Every call observed, in order.
    pub calls: Vec<Call>,
}

/// Firmware double sharing the command page with the channel under test.
#[derive(Clone)]
pub struct ScriptedFirmware {
    words: Arc<Mutex<[u32; 9]>>,
    state: Arc<Mutex<FirmwareState>>,
}

impl ScriptedFirmware {
    pub fn new(current_hz: u32, accepted: &[u32]) -> Self {
        Self {
            words: Arc::new(Mutex::new([0; 9])),
            state: Arc::new(Mutex::new(FirmwareState {
                share_status: 0,
                current_hz,
                accepted: accepted.to_vec(),
                rounded: Vec::new(),
                set_rate_result: (0, 0),
                apply_set_rate: true,
                get_rate_fail: false,
                calls: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FirmwareState> {
        self.state.lock().unwrap()
    }

    pub fn set_rate_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::SetRate(_)))
            .count()
    }

    pub fn round_rate_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::RoundRate(_)))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }
}

impl Firmware for ScriptedFirmware {
    fn call(&self, function: u32, args: [u64; 7]) -> SipResult {
        let mut state = self.state.lock().unwrap();
        match function {
            SIP_SHARE_MEM => {
                state.calls.push(Call::SharePage);
                if state.share_status != 0 {
                    SipResult::new(state.share_status, 0, 0, 0)
                } else {
                    SipResult::new(0, PHYS, 0, 0)
                }
            }
            SIP_DRAM_FREQ => {
                let cmd = args[2];
                if cmd == DramCmd::GetVersion as u64 {
                    state.calls.push(Call::Version);
                    SipResult::new(0, 0x203, 0, 0)
                } else if cmd == DramCmd::RoundRate as u64 {
                    let hz = self.words.lock().unwrap()[page::HZ / 4];
                    state.calls.push(Call::RoundRate(hz));
                    let echo = match state.rounded.iter().find(|(from, _)| *from == hz) {
                        Some(&(_, to)) => to,
                        None if state.accepted.contains(&hz) => hz,
                        None => 0,
                    };
                    SipResult::new(0, u64::from(echo), 0, 0)
                } else if cmd == DramCmd::SetRate as u64 {
                    let words = *self.words.lock().unwrap();
                    let hz = words[page::HZ / 4];
                    state.calls.push(Call::SetRate(hz));
                    // Both handshake flags must reach firmware as zero.
                    assert_eq!(words[page::WAIT_FLAG_A / 4], 0);
                    assert_eq!(words[page::WAIT_FLAG_B / 4], 0);
                    let (a0, a1) = state.set_rate_result;
                    if a0 == 0 && state.apply_set_rate {
                        state.current_hz = hz;
                    }
                    SipResult::new(a0, a1, 0, 0)
                } else if cmd == DramCmd::GetRate as u64 {
                    state.calls.push(Call::GetRate);
                    if state.get_rate_fail {
                        SipResult::new(1, 0, 0, 0)
                    } else {
                        SipResult::new(0, u64::from(state.current_hz), 0, 0)
                    }
                } else {
                    SipResult::new(u64::MAX, 0, 0, 0)
                }
            }
            _ => SipResult::new(u64::MAX, 0, 0, 0),
        }
    }

    fn map_shared(&self, phys: u64) -> Result<Box<dyn PageAccess + Send>, ChannelError> {
        assert_eq!(phys, PHYS);
        Ok(Box::new(WordsPage(Arc::clone(&self.words))))
    }
}

struct WordsPage(Arc<Mutex<[u32; 9]>>);

impl PageAccess for WordsPage {
    fn write_word(&mut self, offset: usize, value: u32) {
        self.0.lock().unwrap()[offset / 4] = value;
    }

    fn read_word(&self, offset: usize) -> u32 {
        self.0.lock().unwrap()[offset / 4]
    }
}

#[derive(Default)]
struct GateInner {
    blocks: AtomicUsize,
    unblocks: AtomicUsize,
    deny: AtomicBool,
}

/// Gate double counting every acquisition and release.
#[derive(Clone, Default)]
pub struct CountingGate {
    inner: Arc<GateInner>,
}

impl CountingGate {
    pub fn blocks(&self) -> usize {
        self.inner.blocks.load(Ordering::SeqCst)
    }

    pub fn unblocks(&self) -> usize {
        self.inner.unblocks.load(Ordering::SeqCst)
    }

    pub fn set_deny(&self, deny: bool) {
        self.inner.deny.store(deny, Ordering::SeqCst);
    }
}

impl TransitionGate for CountingGate {
    fn block(&self) -> Result<(), GateBusy> {
        if self.inner.deny.load(Ordering::SeqCst) {
            return Err(GateBusy);
        }
        self.inner.blocks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unblock(&self) {
        self.inner.unblocks.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CounterInner {
    enables: AtomicUsize,
    disables: AtomicUsize,
    fail: AtomicBool,
}

/// Event-counter double returning a fixed sample.
#[derive(Clone, Default)]
pub struct StubCounter {
    inner: Arc<CounterInner>,
}

impl StubCounter {
    pub fn enables(&self) -> usize {
        self.inner.enables.load(Ordering::SeqCst)
    }

    pub fn disables(&self) -> usize {
        self.inner.disables.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }
}

impl BandwidthCounter for StubCounter {
    fn enable(&self) -> Result<(), CounterUnavailable> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(CounterUnavailable);
        }
        self.inner.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&self) -> Result<(), CounterUnavailable> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(CounterUnavailable);
        }
        self.inner.disables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self) -> Result<BandwidthSample, CounterUnavailable> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(CounterUnavailable);
        }
        Ok(BandwidthSample {
            busy: 400,
            total: 1000,
        })
    }
}

/// Read-only clock double for the last-resort rate fallback.
pub struct FixedClock(pub Option<u32>);

impl ClockSource for FixedClock {
    fn rate(&self) -> Option<u32> {
        self.0
    }
}
