use dcpu16_core::cpu::Reg;
use dcpu16_core::machine;
mod common;
use common::*;

#[test]
fn int_with_no_handler_is_discarded() {
    // int 0x42 ; set b, 1 — IA is 0, message evaporates.
    let mut m = machine_with(&[ins(0x00, 0x08, NXL), 0x0042, ins(0x01, B, lit(1))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::B), 1);
    assert_eq!(m.cpu.pending_interrupts(), 0);
    assert_eq!(m.cpu.reg(Reg::A), 0);
}

#[test]
fn software_interrupt_delivery() {
    // ias 0x0100 ; int 0x00aa — delivered right after the int executes.
    let mut m = machine_with(&[
        ins(0x00, 0x0a, NXL),
        0x0100,
        ins(0x00, 0x08, NXL),
        0x00aa,
    ]);
    m.cpu.set_reg(Reg::A, 0x1111);
    step_n(&mut m, 2);

    assert_eq!(m.cpu.pc, 0x0100);
    assert_eq!(m.cpu.reg(Reg::A), 0x00aa);
    assert!(m.cpu.queueing(), "handlers run with delivery deferred");
    // Stack holds the old PC, then the old A on top.
    assert_eq!(m.cpu.sp, 0xfffe);
    assert_eq!(m.cpu.read(0xffff), 4);
    assert_eq!(m.cpu.read(0xfffe), 0x1111);
}

#[test]
fn rfi_restores_a_and_pc() {
    // Handler at 0x0100 is a single rfi.
    let mut m = machine_with(&[
        ins(0x00, 0x0a, NXL), // ias 0x0100
        0x0100,
        ins(0x00, 0x08, NXL), // int 0x00aa
        0x00aa,
        ins(0x01, B, lit(1)), // resumes here
    ]);
    m.cpu.write(0x0100, ins(0x00, 0x0b, lit(0))); // rfi 0
    m.cpu.set_reg(Reg::A, 0x1111);
    step_n(&mut m, 3);

    assert_eq!(m.cpu.reg(Reg::A), 0x1111);
    assert_eq!(m.cpu.pc, 4);
    assert_eq!(m.cpu.sp, 0);
    assert!(!m.cpu.queueing());

    m.step();
    assert_eq!(m.cpu.reg(Reg::B), 1);
}

#[test]
fn iaq_defers_delivery() {
    let mut m = machine_with(&[
        ins(0x00, 0x0a, NXL), // ias 0x0100
        0x0100,
        ins(0x00, 0x0c, lit(1)), // iaq 1
        ins(0x00, 0x08, NXL),    // int 0x0007
        0x0007,
        ins(0x01, B, lit(1)),    // still straight-line
        ins(0x00, 0x0c, lit(0)), // iaq 0 — delivery resumes
    ]);
    step_n(&mut m, 4);
    assert_eq!(m.cpu.reg(Reg::B), 1);
    assert_eq!(m.cpu.pending_interrupts(), 1);
    assert_eq!(m.cpu.pc, 6);

    m.step(); // iaq 0, then the queued message lands
    assert_eq!(m.cpu.pc, 0x0100);
    assert_eq!(m.cpu.reg(Reg::A), 0x0007);
    assert_eq!(m.cpu.pending_interrupts(), 0);
}

#[test]
fn one_delivery_per_instruction() {
    let mut m = machine_with(&[ins(0x01, B, lit(1))]);
    m.cpu.ia = 0x0200;
    m.cpu.interrupt(0x0001);
    m.cpu.interrupt(0x0002);
    m.step();
    assert_eq!(m.cpu.pc, 0x0200);
    assert_eq!(m.cpu.reg(Reg::A), 0x0001);
    assert_eq!(m.cpu.pending_interrupts(), 1, "second message stays queued");
}

#[test]
fn no_delivery_while_queueing() {
    let mut m = machine_with(&[ins(0x01, B, lit(1))]);
    m.cpu.ia = 0x0200;
    m.cpu.set_queueing(true);
    m.cpu.interrupt(0x0001);
    m.step();
    assert_eq!(m.cpu.pc, 1);
    assert_eq!(m.cpu.pending_interrupts(), 1);
}

#[test]
fn iag_reads_back_the_handler() {
    let mut m = machine_with(&[
        ins(0x00, 0x0a, NXL), // ias 0x0123
        0x0123,
        ins(0x00, 0x09, A), // iag a
    ]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0x0123);
}

#[test]
fn queue_overflow_requests_break() {
    let mut m = machine();
    machine::take_break(); // clear any leftover request

    // 256 messages fit.
    for i in 0..256u16 {
        m.cpu.interrupt(i);
    }
    assert_eq!(m.cpu.pending_interrupts(), 256);
    assert!(!machine::take_break());

    // The 257th overflows: dropped, and the break flag trips.
    m.cpu.interrupt(0xffff);
    assert_eq!(m.cpu.pending_interrupts(), 256);
    assert!(machine::take_break());
}
