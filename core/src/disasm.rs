//! Textual disassembly of the word stream, operand syntax per spec 1.7.

use crate::cpu::{Dcpu, Reg, field_a, field_b, opcode, special_opcode};
use crate::machine::{Op, SpecialOp};

fn reg_name(field: u16) -> &'static str {
    Reg::ALL[(field & 0x7) as usize].name()
}

/// Format one operand field, consuming extra words through `pc`.
fn operand(cpu: &Dcpu, pc: &mut u16, field: u16, is_a: bool) -> String {
    let mut next = || {
        let word = cpu.read(*pc);
        *pc = pc.wrapping_add(1);
        word
    };

    match field {
        0x00..=0x07 => reg_name(field).to_string(),
        0x08..=0x0f => format!("[{}]", reg_name(field)),
        0x10..=0x17 => format!("[{} + 0x{:04x}]", reg_name(field), next()),
        0x18 => (if is_a { "pop" } else { "push" }).to_string(),
        0x19 => "peek".to_string(),
        0x1a => format!("pick 0x{:04x}", next()),
        0x1b => "sp".to_string(),
        0x1c => "pc".to_string(),
        0x1d => "ex".to_string(),
        0x1e => format!("[0x{:04x}]", next()),
        0x1f => format!("0x{:04x}", next()),
        // Embedded literal, -1..=30.
        _ => format!("{}", (field as i32) - 0x21),
    }
}

/// Disassemble the instruction at `pc`. Returns the text and the
/// address of the following instruction.
pub fn disassemble(cpu: &Dcpu, pc: u16) -> (String, u16) {
    let mut pc = pc;
    let instr = cpu.read(pc);
    pc = pc.wrapping_add(1);

    if opcode(instr) != 0 {
        // "set pc, <a>" reads better as a jump.
        if instr & 0x03ff == 0x0381 {
            let a = operand(cpu, &mut pc, field_a(instr), true);
            return (format!("jmp {a}"), pc);
        }
        let text = match Op::from_code(opcode(instr)) {
            Some(op) => {
                let a = operand(cpu, &mut pc, field_a(instr), true);
                let b = operand(cpu, &mut pc, field_b(instr), false);
                format!("{} {b}, {a}", op.mnemonic())
            }
            None => format!("dat 0x{instr:04x}"),
        };
        return (text, pc);
    }

    let text = match SpecialOp::from_code(special_opcode(instr)) {
        Some(op) => {
            let a = operand(cpu, &mut pc, field_a(instr), true);
            format!("{} {a}", op.mnemonic())
        }
        None => format!("dat 0x{instr:04x}"),
    };
    (text, pc)
}
