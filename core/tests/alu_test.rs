use dcpu16_core::cpu::Reg;
mod common;
use common::*;

// =============================================================================
// ADD / SUB
// =============================================================================

#[test]
fn add_without_carry() {
    // set a, 5 ; add a, 3
    let mut m = machine_with(&[ins(0x01, A, lit(5)), ins(0x02, A, lit(3))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 8);
    assert_eq!(m.cpu.ex, 0);
}

#[test]
fn add_overflow_sets_ex() {
    // set a, 0xffff ; add a, 1
    let mut m = machine_with(&[ins(0x01, A, lit(-1)), ins(0x02, A, lit(1))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0);
    assert_eq!(m.cpu.ex, 1);
}

#[test]
fn sub_underflow_sets_ex() {
    // set a, 0 ; sub a, 1
    let mut m = machine_with(&[ins(0x01, A, lit(0)), ins(0x03, A, lit(1))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0xffff);
    assert_eq!(m.cpu.ex, 0xffff);
}

#[test]
fn sub_then_add_is_identity() {
    // set a, 7 ; sub a, 9 ; add a, 9
    let mut m = machine_with(&[
        ins(0x01, A, lit(7)),
        ins(0x03, A, lit(9)),
        ins(0x02, A, lit(9)),
    ]);
    step_n(&mut m, 3);
    assert_eq!(m.cpu.reg(Reg::A), 7);
    // The wrap back up carries.
    assert_eq!(m.cpu.ex, 1);
}

// =============================================================================
// MUL / MLI
// =============================================================================

#[test]
fn mul_high_word_goes_to_ex() {
    // set a, 0x1000 ; mul a, 0x0010 — product 0x10000.
    let mut m = machine_with(&[ins(0x01, A, NXL), 0x1000, ins(0x04, A, lit(16))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0);
    assert_eq!(m.cpu.ex, 1);
}

#[test]
fn mli_is_signed() {
    // set a, -2 ; mli a, 3 — product -6, high word all ones.
    let mut m = machine_with(&[ins(0x01, A, lit(-2)), ins(0x05, A, lit(3))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0xfffa);
    assert_eq!(m.cpu.ex, 0xffff);
}

// =============================================================================
// DIV / DVI / MOD / MDI
// =============================================================================

#[test]
fn div_by_zero_yields_zero() {
    // set a, 5 ; div a, 0
    let mut m = machine_with(&[ins(0x01, A, lit(5)), ins(0x06, A, lit(0))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0);
    assert_eq!(m.cpu.ex, 0);
}

#[test]
fn div_fractional_part_lands_in_ex() {
    // set a, 1 ; div a, 2 — quotient 0, EX = 0x8000 (one half).
    let mut m = machine_with(&[ins(0x01, A, lit(1)), ins(0x06, A, lit(2))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0);
    assert_eq!(m.cpu.ex, 0x8000);
}

#[test]
fn dvi_truncates_toward_zero() {
    // set a, -7 ; dvi a, 2 — quotient truncates to -3.
    let mut m = machine_with(&[ins(0x01, A, NXL), 0xfff9, ins(0x07, A, lit(2))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0xfffd);
}

#[test]
fn dvi_extreme_operands() {
    // set a, 0x8000 ; dvi a, -1 — quotient 0x8000 (wraps), no panic.
    let mut m = machine_with(&[ins(0x01, A, NXL), 0x8000, ins(0x07, A, lit(-1))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0x8000);
}

#[test]
fn mod_and_mdi_signs() {
    // set a, -7 ; mdi a, 2 — remainder takes the sign of b: -1.
    let mut m = machine_with(&[ins(0x01, A, NXL), 0xfff9, ins(0x09, A, lit(2))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0xffff);

    // set b, 7 ; mod b, 4
    let mut m = machine_with(&[ins(0x01, B, lit(7)), ins(0x08, B, lit(4))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::B), 3);

    // mod by zero is defined as zero.
    let mut m = machine_with(&[ins(0x01, B, lit(7)), ins(0x08, B, lit(0))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::B), 0);
}

// =============================================================================
// Bitwise
// =============================================================================

#[test]
fn and_bor_xor() {
    let mut m = machine_with(&[
        ins(0x01, A, NXL),
        0x0ff0,
        ins(0x0a, A, NXL), // and a, 0x00ff
        0x00ff,
    ]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0x00f0);

    let mut m = machine_with(&[ins(0x01, A, lit(0x0c)), ins(0x0b, A, lit(0x03))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0x0f);

    let mut m = machine_with(&[ins(0x01, A, lit(0x0f)), ins(0x0c, A, lit(0x05))]);
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0x0a);
}

// =============================================================================
// ADX / SBX
// =============================================================================

#[test]
fn adx_includes_carry_in() {
    // With EX = 1: 2 + 3 + 1 = 6, carry clears.
    let mut m = machine_with(&[ins(0x01, A, lit(2)), ins(0x1a, A, lit(3))]);
    m.cpu.ex = 1;
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 6);
    assert_eq!(m.cpu.ex, 0);
}

#[test]
fn adx_carry_out_counts_the_carry_in() {
    // 0xffff + 0 + EX(1) overflows; the old detection (sum < b) missed
    // this case.
    let mut m = machine_with(&[ins(0x01, A, lit(-1)), ins(0x1a, A, lit(0))]);
    m.cpu.ex = 1;
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0);
    assert_eq!(m.cpu.ex, 1);
}

#[test]
fn sbx_borrow_chain() {
    // 5 - 3 + EX(-1) = 1, no borrow.
    let mut m = machine_with(&[ins(0x01, A, lit(5)), ins(0x1b, A, lit(3))]);
    m.cpu.ex = 0xffff;
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 1);
    assert_eq!(m.cpu.ex, 0);

    // 0 - 0 + EX(-1) = -1: wraps and keeps borrowing.
    let mut m = machine_with(&[ins(0x01, A, lit(0)), ins(0x1b, A, lit(0))]);
    m.cpu.ex = 0xffff;
    step_n(&mut m, 2);
    assert_eq!(m.cpu.reg(Reg::A), 0xffff);
    assert_eq!(m.cpu.ex, 0xffff);
}

// =============================================================================
// STI / STD
// =============================================================================

#[test]
fn sti_copies_and_bumps_ij() {
    // sti b, a
    let mut m = machine_with(&[ins(0x1e, B, A)]);
    m.cpu.set_reg(Reg::A, 0x42);
    m.cpu.set_reg(Reg::I, 10);
    m.cpu.set_reg(Reg::J, 20);
    m.step();
    assert_eq!(m.cpu.reg(Reg::B), 0x42);
    assert_eq!(m.cpu.reg(Reg::I), 11);
    assert_eq!(m.cpu.reg(Reg::J), 21);
}

#[test]
fn std_wraps_downward() {
    // std b, a with i = 0
    let mut m = machine_with(&[ins(0x1f, B, A)]);
    m.step();
    assert_eq!(m.cpu.reg(Reg::I), 0xffff);
    assert_eq!(m.cpu.reg(Reg::J), 0xffff);
}

#[test]
fn ex_update_survives_literal_destination() {
    // add 5, 0xffff — write is discarded, EX still records the carry.
    let mut m = machine_with(&[ins(0x02, 0x1f, lit(-1)), 0x0005]);
    m.step();
    assert_eq!(m.cpu.ex, 1);
}
