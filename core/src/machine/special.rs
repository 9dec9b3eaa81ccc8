//! Special (zero-opcode) instructions: subroutines, emulator services,
//! the interrupt surface, and hardware interrogation.

use crate::cpu::{Reg, field_a, special_opcode};
use crate::image;

use super::{Action, Machine};

/// Special opcodes. `IMG`, `DIE`, and `DBG` are emulator extensions
/// (core dump, clean halt, debugger entry).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialOp {
    Jsr,
    Img,
    Die,
    Dbg,
    Int,
    Iag,
    Ias,
    Rfi,
    Iaq,
    Hwn,
    Hwq,
    Hwi,
}

impl SpecialOp {
    pub fn from_code(code: u16) -> Option<SpecialOp> {
        Some(match code {
            0x01 => SpecialOp::Jsr,
            0x02 => SpecialOp::Img,
            0x03 => SpecialOp::Die,
            0x04 => SpecialOp::Dbg,
            0x08 => SpecialOp::Int,
            0x09 => SpecialOp::Iag,
            0x0a => SpecialOp::Ias,
            0x0b => SpecialOp::Rfi,
            0x0c => SpecialOp::Iaq,
            0x10 => SpecialOp::Hwn,
            0x11 => SpecialOp::Hwq,
            0x12 => SpecialOp::Hwi,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            SpecialOp::Jsr => "jsr",
            SpecialOp::Img => "img",
            SpecialOp::Die => "die",
            SpecialOp::Dbg => "dbg",
            SpecialOp::Int => "int",
            SpecialOp::Iag => "iag",
            SpecialOp::Ias => "ias",
            SpecialOp::Rfi => "rfi",
            SpecialOp::Iaq => "iaq",
            SpecialOp::Hwn => "hwn",
            SpecialOp::Hwq => "hwq",
            SpecialOp::Hwi => "hwi",
        }
    }
}

impl Machine {
    pub(crate) fn exec_special(&mut self, instr: u16) -> Action {
        let code = special_opcode(instr);
        let (a, dest) = self.decode_arg(field_a(instr), true, true);

        let Some(op) = SpecialOp::from_code(code) else {
            log::warn!(
                "reserved non-basic instruction: 0x{code:04x}, pc now 0x{:04x}",
                self.cpu.pc
            );
            return Action::Break;
        };

        match op {
            SpecialOp::Jsr => {
                self.cpu.push(self.cpu.pc);
                self.cpu.pc = a;
                self.await_tick();
                self.await_tick();
            }

            SpecialOp::Img => {
                if let Err(e) = image::core_dump(&self.cpu, u32::from(a)) {
                    log::error!("{e}");
                }
            }

            SpecialOp::Die => return Action::Exit,

            SpecialOp::Dbg => return Action::Break,

            SpecialOp::Int => {
                self.await_tick();
                self.await_tick();
                self.await_tick();
                self.cpu.interrupt(a);
            }

            SpecialOp::Iag => self.store(dest, self.cpu.ia),

            SpecialOp::Ias => self.cpu.ia = a,

            SpecialOp::Rfi => {
                self.cpu.set_queueing(false);
                let acc = self.cpu.pop();
                self.cpu.set_reg(Reg::A, acc);
                self.cpu.pc = self.cpu.pop();
                self.await_tick();
                self.await_tick();
            }

            SpecialOp::Iaq => {
                self.cpu.set_queueing(a != 0);
                self.await_tick();
            }

            SpecialOp::Hwn => {
                self.store(dest, self.hw.len() as u16);
                self.await_tick();
            }

            SpecialOp::Hwq => {
                if let Some(dev) = self.hw.get(a as usize) {
                    let id = dev.id();
                    let mfr = dev.mfr();
                    let version = dev.version();
                    self.cpu.set_reg(Reg::A, id as u16);
                    self.cpu.set_reg(Reg::B, (id >> 16) as u16);
                    self.cpu.set_reg(Reg::C, version);
                    self.cpu.set_reg(Reg::X, mfr as u16);
                    self.cpu.set_reg(Reg::Y, (mfr >> 16) as u16);
                }
                self.await_tick();
                self.await_tick();
                self.await_tick();
            }

            SpecialOp::Hwi => {
                let now = self.pacer.now_ns();
                let extra = match self.hw.get_mut(a as usize) {
                    Some(dev) => dev.hwi(&mut self.cpu, now),
                    None => 0,
                };
                for _ in 0..extra {
                    self.await_tick();
                }
                self.await_tick();
                self.await_tick();
                self.await_tick();
            }
        }

        Action::Continue
    }
}
