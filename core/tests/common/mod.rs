#![allow(dead_code)]

pub use dcpu16_core::cpu::instruction as ins;
use dcpu16_core::prelude::*;

// Operand field encodings, named for test readability.
pub const POP: u16 = 0x18; // as `a`
pub const PUSH: u16 = 0x18; // as `b`
pub const PEEK: u16 = 0x19;
pub const PICK: u16 = 0x1a;
pub const SP: u16 = 0x1b;
pub const PC: u16 = 0x1c;
pub const EX: u16 = 0x1d;
pub const NXA: u16 = 0x1e; // [next word]
pub const NXL: u16 = 0x1f; // next word literal

// Register fields by encoding index.
pub const A: u16 = 0;
pub const B: u16 = 1;
pub const C: u16 = 2;
pub const X: u16 = 3;
pub const Y: u16 = 4;
pub const Z: u16 = 5;
pub const I: u16 = 6;
pub const J: u16 = 7;

/// Embedded literal field for values -1..=30.
pub fn lit(n: i32) -> u16 {
    assert!((-1..=30).contains(&n), "embedded literals cover -1..=30");
    (n + 0x21) as u16
}

/// A machine paced fast enough that tests never sleep.
pub fn machine() -> Machine {
    Machine::new(1_000_000)
}

/// A machine with `words` loaded at address 0.
pub fn machine_with(words: &[u16]) -> Machine {
    let mut m = machine();
    m.cpu.ram[..words.len()].copy_from_slice(words);
    m
}

pub fn step_n(m: &mut Machine, n: usize) {
    for _ in 0..n {
        m.step();
    }
}
