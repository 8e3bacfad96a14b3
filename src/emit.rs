// RM-8 Instruction Emitter
//
// Builds the textual instruction stream consumed by the virtual machine.
// Each line is `OPCODE[ ARGUMENT][ #COMMENT]`; the argument is a
// non-negative decimal integer and everything after `#` is ignored by the
// machine. Jump placeholders are emitted without an argument and patched
// in place once the label manager learns the target address.

use std::fmt;

/// One of the eight registers of the RM-8 machine.
///
/// Register `a` doubles as the accumulator: `ADD`, `SUB` and the
/// conditional jumps all operate on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let letter = match self {
            Reg::A => "a",
            Reg::B => "b",
            Reg::C => "c",
            Reg::D => "d",
            Reg::E => "e",
            Reg::F => "f",
            Reg::G => "g",
            Reg::H => "h",
        };
        write!(f, "{}", letter)
    }
}

/// Register-addressed opcodes of the RM-8 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    /// Zero the register.
    Rst,
    /// Increment the register.
    Inc,
    /// Shift left (double, losing no bits).
    Shl,
    /// Shift right (halve, flooring).
    Shr,
    /// Exchange the register with the accumulator.
    Swp,
    /// Add the register into the accumulator.
    Add,
    /// Subtract the register from the accumulator, saturating at zero.
    Sub,
}

impl fmt::Display for RegOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RegOp::Rst => "RST",
            RegOp::Inc => "INC",
            RegOp::Shl => "SHL",
            RegOp::Shr => "SHR",
            RegOp::Swp => "SWP",
            RegOp::Add => "ADD",
            RegOp::Sub => "SUB",
        };
        write!(f, "{}", name)
    }
}

/// Control-transfer opcodes; the argument is an absolute instruction index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOp {
    Jump,
    /// Branch if the accumulator is zero.
    Jzero,
    /// Branch if the accumulator is strictly positive.
    Jpos,
}

impl fmt::Display for JumpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            JumpOp::Jump => "JUMP",
            JumpOp::Jzero => "JZERO",
            JumpOp::Jpos => "JPOS",
        };
        write!(f, "{}", name)
    }
}

/// Appends instruction lines to the compilation's output buffer.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    code: Vec<String>,
}

impl CodeEmitter {
    pub fn new() -> Self {
        CodeEmitter { code: Vec::new() }
    }

    /// Current instruction count, i.e. the address of the next emitted
    /// instruction.
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Emit a bare instruction, e.g. `HALT`.
    pub fn emit(&mut self, opcode: &str) {
        self.code.push(opcode.to_string());
    }

    /// Emit an instruction with a numeric argument, e.g. `LOAD 4`.
    pub fn emit_with_arg(&mut self, opcode: &str, arg: u64) {
        self.code.push(format!("{} {}", opcode, arg));
    }

    /// Emit an instruction with an argument and a trailing comment the
    /// machine ignores.
    pub fn emit_with_comment(&mut self, opcode: &str, arg: u64, comment: &str) {
        self.code.push(format!("{} {} #{}", opcode, arg, comment));
    }

    /// Emit a register instruction, e.g. `RST a`.
    pub fn emit_reg(&mut self, op: RegOp, reg: Reg) {
        self.code.push(format!("{} {}", op, reg));
    }

    /// Emit a register instruction with a trailing comment.
    pub fn emit_reg_with_comment(&mut self, op: RegOp, reg: Reg, comment: &str) {
        self.code.push(format!("{} {} #{}", op, reg, comment));
    }

    /// Emit a jump with a known target address.
    pub fn emit_jump(&mut self, op: JumpOp, target: usize) {
        self.code.push(format!("{} {}", op, target));
    }

    /// Emit a jump whose target is not known yet and return its position
    /// for later patching.
    pub fn emit_jump_placeholder(&mut self, op: JumpOp) -> usize {
        let position = self.code.len();
        self.code.push(op.to_string());
        position
    }

    /// Rewrite the placeholder at `position` into a resolved jump.
    pub fn patch_jump(&mut self, position: usize, op: JumpOp, target: usize) {
        if position >= self.code.len() {
            panic!(
                "COMPILER BUG: patching instruction {} past end of stream ({})",
                position,
                self.code.len()
            );
        }
        self.code[position] = format!("{} {}", op, target);
    }

    // Shorthands for the register opcodes; these keep the arithmetic
    // generators readable.

    pub fn rst(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Rst, reg);
    }

    pub fn inc(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Inc, reg);
    }

    pub fn shl(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Shl, reg);
    }

    pub fn shr(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Shr, reg);
    }

    pub fn swp(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Swp, reg);
    }

    pub fn add(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Add, reg);
    }

    pub fn sub(&mut self, reg: Reg) {
        self.emit_reg(RegOp::Sub, reg);
    }

    /// The emitted lines so far.
    pub fn lines(&self) -> &[String] {
        &self.code
    }

    /// Consume the emitter and hand the instruction stream to the caller.
    pub fn into_lines(self) -> Vec<String> {
        self.code
    }
}
