//! Generic keyboard device.
//!
//! The device owns a bounded FIFO of DCPU key codes. Keys arrive from a
//! [`KeySource`] — the terminal (or window) backend — which must hand
//! over codes already mapped per the keyboard spec (0x10 backspace,
//! 0x11 enter, 0x80..=0x83 arrows, printable ASCII as itself). Polling
//! is rate-limited to a nominal serial baud so buffered typing trickles
//! in rather than landing in one burst.

use crate::cpu::{Dcpu, Reg};

pub const HW_ID: u32 = 0x30cf_7406;
pub const HW_MFR: u32 = 0x0122_0423;
pub const HW_VERSION: u16 = 1;

/// Key-buffer slots. The source keeps buffering beyond this; we just
/// stop draining it until the program catches up.
const KEYBUF_SIZE: usize = 256;

/// Polls per second against the key source.
const KBD_BAUD: u64 = 100_000;

/// Where key codes come from.
pub trait KeySource {
    /// Take one pending key, already mapped to DCPU codes.
    fn poll_key(&mut self) -> Option<u16>;

    /// Whether `code` is held right now. Sources without key-state
    /// tracking (terminals) conservatively answer no.
    fn key_held(&mut self, code: u16) -> bool {
        let _ = code;
        false
    }
}

/// A source that never produces keys, for headless use.
pub struct NoKeys;

impl KeySource for NoKeys {
    fn poll_key(&mut self) -> Option<u16> {
        None
    }
}

pub struct Keyboard {
    buf: [u16; KEYBUF_SIZE],
    read: usize,
    write: usize,
    msg: u16,
    keyns: u64,
    nextkey: u64,
    source: Box<dyn KeySource>,
}

impl Keyboard {
    pub fn new(source: Box<dyn KeySource>) -> Self {
        Self {
            buf: [0; KEYBUF_SIZE],
            read: 0,
            write: 0,
            msg: 0,
            keyns: 1_000_000_000 / KBD_BAUD,
            nextkey: 0,
            source,
        }
    }

    fn pop_key(&mut self) -> u16 {
        if self.read == self.write {
            return 0;
        }
        let key = self.buf[self.read];
        self.read = (self.read + 1) % KEYBUF_SIZE;
        key
    }

    /// Poll the source for one key, if the buffer has room. Raises the
    /// configured interrupt per key received.
    fn check_key(&mut self, cpu: &mut Dcpu) {
        let next_write = (self.write + 1) % KEYBUF_SIZE;
        if next_write == self.read {
            return;
        }
        if let Some(key) = self.source.poll_key() {
            self.buf[self.write] = key;
            self.write = next_write;
            if self.msg != 0 {
                cpu.interrupt(self.msg);
            }
        }
    }

    pub fn hwi(&mut self, cpu: &mut Dcpu) -> u16 {
        match cpu.reg(Reg::A) {
            0 => {
                // Clear the buffer. The source may still hold typed-ahead
                // keys; those arrive as fresh input.
                self.read = 0;
                self.write = 0;
            }
            1 => {
                let key = self.pop_key();
                cpu.set_reg(Reg::C, key);
            }
            2 => {
                let code = cpu.reg(Reg::B);
                let held = self.source.key_held(code);
                cpu.set_reg(Reg::C, u16::from(held));
            }
            3 => self.msg = cpu.reg(Reg::B),
            other => log::warn!("unknown keyboard HWI: 0x{other:04x}"),
        }
        0
    }

    pub fn tick(&mut self, cpu: &mut Dcpu, now_ns: u64) {
        if now_ns > self.nextkey {
            self.check_key(cpu);
            self.nextkey = now_ns + self.keyns;
        }
    }
}
