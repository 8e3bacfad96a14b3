// Register Arithmetic Code Generation
//
// Fixed instruction sequences for the operations the machine has no
// opcode for: constant materialization, multiplication, division and the
// equality test. Register `a` is the working accumulator throughout,
// `d` the arithmetic scratch and `h` the quotient accumulator; operand
// registers must stay clear of those roles.

use crate::emit::{CodeEmitter, JumpOp, Reg, RegOp};
use crate::labels::{Label, LabelManager};

fn define_fresh(code: &mut CodeEmitter, labels: &mut LabelManager, label: Label) {
    // Labels minted inside this module are fresh; a duplicate definition
    // here is a generator bug, not a user error.
    if labels.define(code, label).is_err() {
        panic!("COMPILER BUG: arithmetic label {} defined twice", label);
    }
}

fn check_operands(operation: &str, operands: &[Reg], reserved: &[Reg]) {
    for (i, reg) in operands.iter().enumerate() {
        if reserved.contains(reg) {
            panic!(
                "COMPILER BUG: {} operand register {} collides with a reserved role",
                operation, reg
            );
        }
        if operands[..i].contains(reg) {
            panic!("COMPILER BUG: {} operand register {} used twice", operation, reg);
        }
    }
}

/// Materialize the constant `value` in `reg`: one reset, at most one
/// leading increment, then one shift-left (plus an increment for 1-bits)
/// per remaining binary digit, top bit down.
pub fn load_constant(code: &mut CodeEmitter, reg: Reg, value: u64) {
    code.rst(reg);
    if value == 0 {
        return;
    }
    code.inc(reg);
    if value == 1 {
        return;
    }
    let bits = 64 - value.leading_zeros();
    for i in (0..bits - 1).rev() {
        code.shl(reg);
        if (value >> i) & 1 == 1 {
            code.inc(reg);
        }
    }
}

/// Russian-peasant multiplication: halve `lhs`, double `rhs`, and add
/// `rhs` into the running sum whenever the bit shifted out of `lhs` is 1.
/// The product lands in `dest`; `lhs` and `rhs` are consumed and `a`/`d`
/// clobbered. `dest` may coincide with either operand.
pub fn multiply(code: &mut CodeEmitter, labels: &mut LabelManager, dest: Reg, lhs: Reg, rhs: Reg) {
    check_operands("multiply", &[lhs, rhs], &[Reg::A, Reg::D]);

    let entry = labels.new_label();
    let even = labels.new_label();
    let exit = labels.new_label();

    code.emit_reg_with_comment(RegOp::Rst, Reg::A, "multiply");
    define_fresh(code, labels, entry);
    // Running sum parks in d while the parity of lhs is computed.
    code.swp(Reg::D);
    code.rst(Reg::A);
    code.add(lhs);
    code.shr(Reg::A);
    code.shl(Reg::A);
    code.swp(lhs);
    code.sub(lhs); // a = lhs mod 2
    labels.reference(code, even, JumpOp::Jzero);
    code.swp(Reg::D);
    code.add(rhs);
    code.swp(Reg::D);
    define_fresh(code, labels, even);
    code.swp(Reg::D);
    code.shl(rhs);
    code.shr(lhs);
    code.swp(lhs);
    labels.reference(code, exit, JumpOp::Jzero);
    code.swp(lhs);
    labels.reference(code, entry, JumpOp::Jump);
    define_fresh(code, labels, exit);
    code.emit_reg_with_comment(RegOp::Swp, lhs, "multiply done");

    if dest != Reg::A {
        code.swp(dest);
    }
}

/// Binary long division by repeated doubling. Leaves the quotient in `h`
/// and the remainder in `dividend`; `divisor` is consumed and `a`/`d`
/// clobbered. A zero divisor short-circuits to quotient 0, remainder 0.
pub fn divide(code: &mut CodeEmitter, labels: &mut LabelManager, dividend: Reg, divisor: Reg) {
    check_operands("divide", &[dividend, divisor], &[Reg::A, Reg::D, Reg::H]);

    let zero_divisor = labels.new_label();
    code.rst(Reg::A);
    code.add(divisor);
    labels.reference(code, zero_divisor, JumpOp::Jzero);

    // Shift counter starts at 1, quotient at 0.
    code.rst(Reg::D);
    code.inc(Reg::D);
    code.rst(Reg::H);

    // Grow: double divisor and counter together until the divisor
    // overshoots the dividend.
    let grow = labels.new_label();
    define_fresh(code, labels, grow);
    code.emit_reg_with_comment(RegOp::Rst, Reg::A, "divide");
    code.add(divisor);
    code.shl(Reg::A);
    code.sub(dividend); // a = 2*divisor - dividend, saturating
    let test = labels.new_label();
    labels.reference(code, test, JumpOp::Jpos);
    code.shl(divisor);
    code.shl(Reg::D);
    labels.reference(code, grow, JumpOp::Jump);

    // Test: done once the shift counter reaches zero.
    define_fresh(code, labels, test);
    code.rst(Reg::A);
    code.add(Reg::D);
    let done = labels.new_label();
    labels.reference(code, done, JumpOp::Jzero);

    // Shrink: subtract the divisor where it fits, crediting the counter
    // into the quotient, then halve both.
    code.rst(Reg::A);
    code.add(divisor);
    code.sub(dividend);
    let shrink = labels.new_label();
    labels.reference(code, shrink, JumpOp::Jpos); // divisor > dividend, skip
    code.swp(dividend);
    code.sub(divisor);
    code.swp(dividend);
    code.swp(Reg::H);
    code.add(Reg::D);
    code.swp(Reg::H);
    define_fresh(code, labels, shrink);
    code.shr(divisor);
    code.shr(Reg::D);
    labels.reference(code, test, JumpOp::Jump);

    define_fresh(code, labels, zero_divisor);
    code.rst(dividend);
    code.rst(Reg::H);
    define_fresh(code, labels, done);
}

/// Leave `(lhs - rhs) + (rhs - lhs)` in the accumulator: zero iff the
/// operands are equal, strictly positive otherwise, under the machine's
/// saturating subtraction. Clobbers `d`; the operands survive.
pub fn compare_equal(code: &mut CodeEmitter, lhs: Reg, rhs: Reg) {
    check_operands("compare_equal", &[lhs, rhs], &[Reg::A, Reg::D]);

    code.rst(Reg::A);
    code.add(lhs);
    code.sub(rhs);
    code.swp(Reg::D);
    code.rst(Reg::A);
    code.add(rhs);
    code.sub(lhs);
    code.add(Reg::D);
}

#[cfg(test)]
#[path = "arith_tests.rs"]
mod tests;
