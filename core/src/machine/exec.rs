//! Operand decoding with effects, the basic opcode matrix, and the skip
//! engine.

use crate::cpu::decode::{
    ARG_EX, ARG_NXA, ARG_NXL, ARG_PC, ARG_PEEK, ARG_PICK, ARG_PSHP, ARG_SP, Loc,
};
use crate::cpu::{Reg, field_a, field_b, opcode};

use super::{Action, Machine};

/// Basic opcodes. Gaps (0x18, 0x19, 0x1c, 0x1d) are reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Set,
    Add,
    Sub,
    Mul,
    Mli,
    Div,
    Dvi,
    Mod,
    Mdi,
    And,
    Bor,
    Xor,
    Shr,
    Asr,
    Shl,
    Ifb,
    Ifc,
    Ife,
    Ifn,
    Ifg,
    Ifa,
    Ifl,
    Ifu,
    Adx,
    Sbx,
    Sti,
    Std,
}

impl Op {
    pub fn from_code(code: u16) -> Option<Op> {
        Some(match code {
            0x01 => Op::Set,
            0x02 => Op::Add,
            0x03 => Op::Sub,
            0x04 => Op::Mul,
            0x05 => Op::Mli,
            0x06 => Op::Div,
            0x07 => Op::Dvi,
            0x08 => Op::Mod,
            0x09 => Op::Mdi,
            0x0a => Op::And,
            0x0b => Op::Bor,
            0x0c => Op::Xor,
            0x0d => Op::Shr,
            0x0e => Op::Asr,
            0x0f => Op::Shl,
            0x10 => Op::Ifb,
            0x11 => Op::Ifc,
            0x12 => Op::Ife,
            0x13 => Op::Ifn,
            0x14 => Op::Ifg,
            0x15 => Op::Ifa,
            0x16 => Op::Ifl,
            0x17 => Op::Ifu,
            0x1a => Op::Adx,
            0x1b => Op::Sbx,
            0x1e => Op::Sti,
            0x1f => Op::Std,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Set => "set",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Mli => "mli",
            Op::Div => "div",
            Op::Dvi => "dvi",
            Op::Mod => "mod",
            Op::Mdi => "mdi",
            Op::And => "and",
            Op::Bor => "bor",
            Op::Xor => "xor",
            Op::Shr => "shr",
            Op::Asr => "asr",
            Op::Shl => "shl",
            Op::Ifb => "ifb",
            Op::Ifc => "ifc",
            Op::Ife => "ife",
            Op::Ifn => "ifn",
            Op::Ifg => "ifg",
            Op::Ifa => "ifa",
            Op::Ifl => "ifl",
            Op::Ifu => "ifu",
            Op::Adx => "adx",
            Op::Sbx => "sbx",
            Op::Sti => "sti",
            Op::Std => "std",
        }
    }
}

/// Conditional opcode range: a failed test skips, and skipped
/// conditionals chain.
fn is_conditional(code: u16) -> bool {
    (0x10..=0x17).contains(&code)
}

#[inline]
fn signed(word: u16) -> i64 {
    i64::from(word as i16)
}

impl Machine {
    /// Resolve one operand field to its value and write-back location.
    ///
    /// With `effects` false (skip decoding) any extra word is still
    /// consumed — `PC` must advance past the whole instruction — but no
    /// cycle is charged for it and `SP` is never touched.
    pub(crate) fn decode_arg(&mut self, field: u16, effects: bool, is_a: bool) -> (u16, Loc) {
        // Embedded literal, range -1..=30. Only encodable in `a`.
        if field & 0x20 != 0 {
            return (field.wrapping_sub(0x21), Loc::None);
        }

        if field & 0x18 == 0x18 {
            return match field {
                ARG_PSHP => {
                    if is_a {
                        // POP: read the old top, then SP++.
                        let top = self.cpu.sp;
                        if effects {
                            self.cpu.sp = top.wrapping_add(1);
                        }
                        (self.cpu.read(top), Loc::Mem(top))
                    } else {
                        // PUSH: --SP, then the new top is the target.
                        if effects {
                            self.cpu.sp = self.cpu.sp.wrapping_sub(1);
                        }
                        let top = self.cpu.sp;
                        (self.cpu.read(top), Loc::Mem(top))
                    }
                }
                ARG_PEEK => (self.cpu.read(self.cpu.sp), Loc::Mem(self.cpu.sp)),
                ARG_PICK => {
                    let offset = self.next_word(effects);
                    let addr = self.cpu.sp.wrapping_add(offset);
                    (self.cpu.read(addr), Loc::Mem(addr))
                }
                ARG_SP => (self.cpu.sp, Loc::Sp),
                ARG_PC => (self.cpu.pc, Loc::Pc),
                ARG_EX => (self.cpu.ex, Loc::Ex),
                ARG_NXA => {
                    let addr = self.next_word(effects);
                    (self.cpu.read(addr), Loc::Mem(addr))
                }
                ARG_NXL => (self.next_word(effects), Loc::None),
                _ => unreachable!("fields 0x18..=0x1f covered above"),
            };
        }

        // Register, [register], or [register + next].
        let r = (field & 0x7) as usize;
        if field & 0x10 != 0 {
            // Consume the extra word first, then read the register.
            let offset = self.next_word(effects);
            let addr = self.cpu.regs[r].wrapping_add(offset);
            (self.cpu.read(addr), Loc::Mem(addr))
        } else if field & 0x8 != 0 {
            let addr = self.cpu.regs[r];
            (self.cpu.read(addr), Loc::Mem(addr))
        } else {
            (self.cpu.regs[r], Loc::Reg(r))
        }
    }

    /// Write a result back. Literal destinations swallow the write.
    pub(crate) fn store(&mut self, loc: Loc, val: u16) {
        match loc {
            Loc::Reg(r) => self.cpu.regs[r] = val,
            Loc::Mem(addr) => self.cpu.write(addr, val),
            Loc::Sp => self.cpu.sp = val,
            Loc::Pc => self.cpu.pc = val,
            Loc::Ex => self.cpu.ex = val,
            Loc::None => {}
        }
    }

    /// Decode-without-effects past the next instruction. Skipped
    /// conditionals chain: keep going until a non-conditional has been
    /// skipped. The whole chain costs a single cycle.
    fn skip(&mut self) {
        loop {
            let instr = self.next_word(false);
            self.decode_arg(field_a(instr), false, true);
            if opcode(instr) != 0 {
                // Specials have no b operand; their opcode sits in the
                // b field and must not be decoded as one.
                self.decode_arg(field_b(instr), false, false);
            }
            if !is_conditional(opcode(instr)) {
                return self.await_tick();
            }
        }
    }

    /// Execute one already-fetched instruction word.
    pub(crate) fn execute(&mut self, instr: u16) -> Action {
        let code = opcode(instr);
        if code == 0 {
            return self.exec_special(instr);
        }

        let (a, _) = self.decode_arg(field_a(instr), true, true);
        let (b, dest) = self.decode_arg(field_b(instr), true, false);

        let Some(op) = Op::from_code(code) else {
            log::warn!("reserved instruction: 0x{code:04x}, pc now 0x{:04x}", self.cpu.pc);
            return Action::Break;
        };

        match op {
            Op::Set => self.store(dest, a),

            Op::Add => {
                let sum = u32::from(b) + u32::from(a);
                self.store(dest, sum as u16);
                self.cpu.ex = u16::from(sum > 0xffff);
                self.await_tick();
            }

            Op::Sub => {
                let (diff, borrow) = b.overflowing_sub(a);
                self.store(dest, diff);
                self.cpu.ex = if borrow { 0xffff } else { 0 };
                self.await_tick();
            }

            Op::Mul => {
                let product = u32::from(b) * u32::from(a);
                self.store(dest, product as u16);
                self.cpu.ex = (product >> 16) as u16;
                self.await_tick();
            }

            Op::Mli => {
                let product = signed(b) * signed(a);
                self.store(dest, product as u16);
                self.cpu.ex = (product >> 16) as u16;
                self.await_tick();
            }

            Op::Div => {
                if a == 0 {
                    self.store(dest, 0);
                    self.cpu.ex = 0;
                } else {
                    self.store(dest, b / a);
                    self.cpu.ex = ((u32::from(b) << 16) / u32::from(a)) as u16;
                }
                self.await_tick();
                self.await_tick();
            }

            Op::Dvi => {
                // Signed quotient truncates toward zero; 64-bit
                // intermediates keep 0x8000 / 0xffff in range.
                if a == 0 {
                    self.store(dest, 0);
                    self.cpu.ex = 0;
                } else {
                    self.store(dest, (signed(b) / signed(a)) as u16);
                    self.cpu.ex = ((signed(b) << 16) / signed(a)) as u16;
                }
                self.await_tick();
                self.await_tick();
            }

            Op::Mod => {
                self.store(dest, if a == 0 { 0 } else { b % a });
                self.await_tick();
                self.await_tick();
            }

            Op::Mdi => {
                // Remainder takes the sign of b.
                self.store(dest, if a == 0 { 0 } else { (signed(b) % signed(a)) as u16 });
                self.await_tick();
                self.await_tick();
            }

            Op::And => self.store(dest, b & a),
            Op::Bor => self.store(dest, b | a),
            Op::Xor => self.store(dest, b ^ a),

            Op::Shr => {
                let sh = u32::from(a).min(63);
                self.store(dest, (u64::from(b) >> sh) as u16);
                self.cpu.ex = ((u64::from(b) << 16) >> sh) as u16;
            }

            Op::Asr => {
                let sh = u32::from(a).min(63);
                self.store(dest, (signed(b) >> sh) as u16);
                self.cpu.ex = ((signed(b) << 16) >> sh) as u16;
            }

            Op::Shl => {
                let sh = u32::from(a).min(63);
                let wide = u64::from(b) << sh;
                self.store(dest, wide as u16);
                self.cpu.ex = (wide >> 16) as u16;
            }

            Op::Ifb => self.conditional((b & a) != 0),
            Op::Ifc => self.conditional((b & a) == 0),
            Op::Ife => self.conditional(b == a),
            Op::Ifn => self.conditional(b != a),
            Op::Ifg => self.conditional(b > a),
            Op::Ifa => self.conditional(signed(b) > signed(a)),
            Op::Ifl => self.conditional(b < a),
            Op::Ifu => self.conditional(signed(b) < signed(a)),

            Op::Adx => {
                let sum = u32::from(b) + u32::from(a) + u32::from(self.cpu.ex);
                self.store(dest, sum as u16);
                self.cpu.ex = u16::from(sum > 0xffff);
                self.await_tick();
                self.await_tick();
            }

            Op::Sbx => {
                // EX participates sign-extended: 0xffff is a borrow of 1.
                let result = i32::from(b) - i32::from(a) + i32::from(self.cpu.ex as i16);
                self.store(dest, result as u16);
                self.cpu.ex = if result < 0 { 0xffff } else { 0 };
                self.await_tick();
                self.await_tick();
            }

            Op::Sti => {
                self.store(dest, a);
                self.bump_ij(1);
                self.await_tick();
            }

            Op::Std => {
                self.store(dest, a);
                self.bump_ij(0xffff);
                self.await_tick();
            }
        }

        Action::Continue
    }

    /// Shared tail of the eight conditionals: skip on a failed test,
    /// charge the conditional's own extra cycle either way.
    fn conditional(&mut self, pass: bool) {
        if !pass {
            self.skip();
        }
        self.await_tick();
    }

    fn bump_ij(&mut self, delta: u16) {
        let i = self.cpu.reg(Reg::I).wrapping_add(delta);
        let j = self.cpu.reg(Reg::J).wrapping_add(delta);
        self.cpu.set_reg(Reg::I, i);
        self.cpu.set_reg(Reg::J, j);
    }
}
