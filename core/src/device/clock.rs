//! Generic clock device.
//!
//! `HWI A=0` sets the tick rate from the divisor in `B` (the clock runs
//! at `60/B` Hz; zero disables it), `A=1` reads the tick counter into
//! `C`, `A=2` sets the interrupt message. While enabled, the tick hook
//! bumps the counter once per period and raises the configured
//! interrupt, if any.

use crate::cpu::{Dcpu, Reg};

pub const HW_ID: u32 = 0x12d0_b402;
pub const HW_MFR: u32 = 0x0122_0423;
pub const HW_VERSION: u16 = 1;

/// Base rate the divisor applies to.
const BASE_HZ: u64 = 60;

pub struct Clock {
    tickns: u64,
    nexttick: u64,
    msg: u16,
    ticks: u16,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// The power-on state of the clock is unspecified; it starts
    /// disabled.
    pub fn new() -> Self {
        Self {
            tickns: 0,
            nexttick: 0,
            msg: 0,
            ticks: 0,
        }
    }

    fn set_rate(&mut self, divisor: u16, now_ns: u64) {
        if divisor == 0 {
            self.tickns = 0;
        } else {
            // Period = divisor/60 s, in nanoseconds. Divisors above 60
            // are legal and tick slower than 1 Hz.
            self.tickns = u64::from(divisor) * 1_000_000_000 / BASE_HZ;
            self.nexttick = now_ns + self.tickns;
        }
        self.ticks = 0;
    }

    /// Ticks counted since the rate was last set.
    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    pub fn hwi(&mut self, cpu: &mut Dcpu, now_ns: u64) -> u16 {
        match cpu.reg(Reg::A) {
            0 => self.set_rate(cpu.reg(Reg::B), now_ns),
            1 => cpu.set_reg(Reg::C, self.ticks),
            2 => self.msg = cpu.reg(Reg::B),
            other => log::warn!("unknown clock HWI: 0x{other:04x}"),
        }
        0
    }

    pub fn tick(&mut self, cpu: &mut Dcpu, now_ns: u64) {
        if self.tickns == 0 {
            return;
        }
        if now_ns > self.nexttick {
            self.ticks = self.ticks.wrapping_add(1);
            if self.msg != 0 {
                cpu.interrupt(self.msg);
            }
            self.nexttick += self.tickns;
        }
    }
}
