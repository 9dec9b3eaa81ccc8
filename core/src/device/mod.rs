//! Hardware devices.
//!
//! The bus holds a closed set of device variants plus a catch-all
//! generic wrapping two callbacks. Devices are data, not owners: every
//! call hands them the CPU explicitly, which is also how they reach RAM
//! for memory-mapped I/O.

pub mod clock;
pub mod keyboard;
pub mod lem;

pub use clock::Clock;
pub use keyboard::Keyboard;
pub use lem::Lem;

use crate::cpu::Dcpu;

/// A device defined by plain callbacks, for hardware the emulator does
/// not model natively (test rigs, experiments).
pub struct Generic {
    pub id: u32,
    pub mfr: u32,
    pub version: u16,
    pub hwi: Box<dyn FnMut(&mut Dcpu, u64) -> u16>,
    pub tick: Box<dyn FnMut(&mut Dcpu, u64)>,
}

/// A device attached to the bus.
pub enum Device {
    Clock(Clock),
    Keyboard(Keyboard),
    Lem(Lem),
    Generic(Generic),
}

impl Device {
    /// 32-bit hardware id reported by `HWQ`.
    pub fn id(&self) -> u32 {
        match self {
            Device::Clock(_) => clock::HW_ID,
            Device::Keyboard(_) => keyboard::HW_ID,
            Device::Lem(_) => lem::HW_ID,
            Device::Generic(g) => g.id,
        }
    }

    /// 32-bit manufacturer id reported by `HWQ`.
    pub fn mfr(&self) -> u32 {
        match self {
            Device::Clock(_) => clock::HW_MFR,
            Device::Keyboard(_) => keyboard::HW_MFR,
            Device::Lem(_) => lem::HW_MFR,
            Device::Generic(g) => g.mfr,
        }
    }

    /// Hardware version reported by `HWQ`.
    pub fn version(&self) -> u16 {
        match self {
            Device::Clock(_) => clock::HW_VERSION,
            Device::Keyboard(_) => keyboard::HW_VERSION,
            Device::Lem(_) => lem::HW_VERSION,
            Device::Generic(g) => g.version,
        }
    }

    /// Handle an `HWI` aimed at this device. Returns extra cycles to
    /// charge on top of the instruction's own cost.
    pub fn hwi(&mut self, cpu: &mut Dcpu, now_ns: u64) -> u16 {
        match self {
            Device::Clock(d) => d.hwi(cpu, now_ns),
            Device::Keyboard(d) => d.hwi(cpu),
            Device::Lem(d) => d.hwi(cpu),
            Device::Generic(g) => (g.hwi)(cpu, now_ns),
        }
    }

    /// Offer the current wall clock to the device. Called once per
    /// guest cycle, before the pacer sleeps.
    pub fn tick(&mut self, cpu: &mut Dcpu, now_ns: u64) {
        match self {
            Device::Clock(d) => d.tick(cpu, now_ns),
            Device::Keyboard(d) => d.tick(cpu, now_ns),
            Device::Lem(d) => d.tick(cpu, now_ns),
            Device::Generic(g) => (g.tick)(cpu, now_ns),
        }
    }

    /// Borrow the LEM state, if this is the display.
    pub fn as_lem(&self) -> Option<&Lem> {
        match self {
            Device::Lem(d) => Some(d),
            _ => None,
        }
    }
}
