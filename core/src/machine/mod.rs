//! The assembled machine: CPU, device bus, and the wall-clock pacer.
//!
//! A single logical thread drives everything. Each guest cycle the pacer
//! reads monotonic time, offers it to every device's tick hook, sleeps
//! until the cycle deadline, and advances the deadline. Cycle accounting
//! happens inside the interpreter: every charged cycle is one
//! `await_tick` call.

mod exec;
mod special;

pub use exec::Op;
pub use special::SpecialOp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cpu::Dcpu;
use crate::device::Device;

/// Device bus capacity.
pub const MAX_DEVICES: usize = 8;

/// What the main loop should do after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    /// Drop into the debugger (reserved instruction, `DBG`, queue
    /// overflow, detected loop).
    Break,
    /// Halt cleanly (`DIE`).
    Exit,
}

// Process-wide, edge-triggered control flags. Input backends and signal
// handlers set them; the main loop consumes them between instructions.
static BREAK_REQUESTED: AtomicBool = AtomicBool::new(false);
static DIE_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Request debugger entry at the next instruction boundary.
pub fn request_break() {
    BREAK_REQUESTED.store(true, Ordering::Relaxed);
}

/// Request clean termination at the next instruction boundary.
pub fn request_die() {
    DIE_REQUESTED.store(true, Ordering::Relaxed);
}

/// Consume a pending break request.
pub fn take_break() -> bool {
    BREAK_REQUESTED.swap(false, Ordering::Relaxed)
}

/// Consume a pending die request.
pub fn take_die() -> bool {
    DIE_REQUESTED.swap(false, Ordering::Relaxed)
}

/// Wall-clock pacing state: nanoseconds per guest cycle and the next
/// cycle's absolute deadline, both measured from a fixed origin.
struct Pacer {
    origin: Instant,
    tickns: u64,
    nexttick: u64,
    cycles: u64,
}

impl Pacer {
    fn new(khz: u32) -> Self {
        Self {
            origin: Instant::now(),
            tickns: 1_000_000 / u64::from(khz.max(1)),
            nexttick: 0,
            cycles: 0,
        }
    }

    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    /// Charge one cycle: sleep out the remainder of the current cycle
    /// (if any) and move the deadline forward.
    fn pace(&mut self, now: u64) {
        self.cycles += 1;
        if now < self.nexttick {
            std::thread::sleep(Duration::from_nanos(self.nexttick - now));
        }
        self.nexttick += self.tickns;
    }
}

/// A DCPU-16 with its hardware attached.
pub struct Machine {
    pub cpu: Dcpu,
    hw: Vec<Device>,
    pacer: Pacer,
    /// Break into the debugger when an instruction jumps to itself.
    pub detect_loops: bool,
}

impl Machine {
    /// Build a machine pacing at `khz` kilohertz with an empty bus.
    pub fn new(khz: u32) -> Self {
        Self {
            cpu: Dcpu::new(),
            hw: Vec::with_capacity(MAX_DEVICES),
            pacer: Pacer::new(khz),
            detect_loops: false,
        }
    }

    /// Register a device. Returns its bus index, or `None` when all
    /// slots are taken. The bus is append-only: devices are attached
    /// during startup and never removed.
    pub fn attach(&mut self, dev: Device) -> Option<u16> {
        if self.hw.len() >= MAX_DEVICES {
            return None;
        }
        self.hw.push(dev);
        Some((self.hw.len() - 1) as u16)
    }

    pub fn devices(&self) -> &[Device] {
        &self.hw
    }

    pub fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.hw
    }

    /// Total guest cycles charged so far.
    pub fn cycles(&self) -> u64 {
        self.pacer.cycles
    }

    /// Nanoseconds of wall clock since the machine was built. This is
    /// the timebase handed to device tick hooks.
    pub fn now_ns(&self) -> u64 {
        self.pacer.now_ns()
    }

    /// Arm the pacer: the first cycle's deadline is one tick from now.
    /// Call once when entering the run loop (and again after long pauses
    /// such as a debugger session, so the machine does not sprint to
    /// catch up).
    pub fn start(&mut self) {
        self.pacer.nexttick = self.pacer.now_ns() + self.pacer.tickns;
    }

    /// Charge one guest cycle: poll devices, then pace.
    pub(crate) fn await_tick(&mut self) {
        let now = self.pacer.now_ns();
        for dev in &mut self.hw {
            dev.tick(&mut self.cpu, now);
        }
        self.pacer.pace(now);
    }

    /// Fetch the word at `PC` and advance. Decoding a word costs a
    /// cycle, *except* while decoding a skipped instruction.
    pub(crate) fn next_word(&mut self, effects: bool) -> u16 {
        if effects {
            self.await_tick();
        }
        let word = self.cpu.read(self.cpu.pc);
        self.cpu.pc = self.cpu.pc.wrapping_add(1);
        word
    }

    /// Execute one instruction, then deliver at most one pending
    /// interrupt.
    pub fn step(&mut self) -> Action {
        let oldpc = self.cpu.pc;
        let instr = self.next_word(true);
        let action = self.execute(instr);
        self.cpu.dispatch_interrupt();
        if self.detect_loops && self.cpu.pc == oldpc {
            log::warn!("loop detected at pc 0x{oldpc:04x}");
            return Action::Break;
        }
        action
    }
}
