// RM-8 Code Generator
//
// One compilation = one `RegMachineCodeGen` value. The frontend's
// semantic actions drive the API below while parsing a translation unit;
// `finalize` consumes the context, verifies that every jump was resolved,
// and hands back the instruction lines. Constructing the context is the
// one-time initializer: it emits the jump that wraps procedure bodies and
// pushes its label, which the frontend defines where the main block
// starts.

use crate::arith;
use crate::emit::{CodeEmitter, JumpOp, Reg};
use crate::error::CompilerError;
use crate::labels::{Label, LabelManager};
use crate::loops::{ForLoop, LoopStack};
use crate::memory::{Address, MemoryAllocator};
use crate::procedures::ProcedureRegistry;
use crate::symbols::{ParamMode, Symbol, SymbolTable};

/// The parser seam: a frontend consumes source text and drives the code
/// generator through its semantic actions.
///
/// Obligations: declare names before referencing them, define the label
/// popped off the stack from construction before generation completes,
/// and surface any `CompilerError` unchanged so the driver can report it.
pub trait Frontend {
    fn compile(&mut self, source: &str, codegen: &mut RegMachineCodeGen)
        -> Result<(), CompilerError>;
}

/// Code generation context for one translation unit.
pub struct RegMachineCodeGen {
    code: CodeEmitter,
    labels: LabelManager,
    memory: MemoryAllocator,
    symbols: SymbolTable,
    procedures: ProcedureRegistry,
    loops: LoopStack,
}

impl Default for RegMachineCodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl RegMachineCodeGen {
    /// Start a compilation. The first emitted instruction is a jump to a
    /// yet-undefined label wrapping everything up to the main block; the
    /// label is left on the label stack for the frontend.
    pub fn new() -> Self {
        let mut codegen = RegMachineCodeGen {
            code: CodeEmitter::new(),
            labels: LabelManager::new(),
            memory: MemoryAllocator::new(),
            symbols: SymbolTable::new(),
            procedures: ProcedureRegistry::new(),
            loops: LoopStack::new(),
        };
        let main = codegen.labels.new_label();
        codegen.labels.push_label(main);
        codegen.labels.reference(&mut codegen.code, main, JumpOp::Jump);
        codegen
    }

    // --- instruction emission ---------------------------------------

    pub fn emit(&mut self, opcode: &str) {
        self.code.emit(opcode);
    }

    pub fn emit_with_arg(&mut self, opcode: &str, arg: u64) {
        self.code.emit_with_arg(opcode, arg);
    }

    pub fn emit_with_comment(&mut self, opcode: &str, arg: u64, comment: &str) {
        self.code.emit_with_comment(opcode, arg, comment);
    }

    /// Current instruction count.
    pub fn position(&self) -> usize {
        self.code.position()
    }

    /// The instruction lines emitted so far.
    pub fn lines(&self) -> &[String] {
        self.code.lines()
    }

    // --- labels and jumps -------------------------------------------

    pub fn new_label(&mut self) -> Label {
        self.labels.new_label()
    }

    pub fn reference(&mut self, label: Label, opcode: JumpOp) {
        self.labels.reference(&mut self.code, label, opcode);
    }

    pub fn define(&mut self, label: Label) -> Result<(), CompilerError> {
        self.labels.define(&mut self.code, label)
    }

    pub fn push_label(&mut self, label: Label) {
        self.labels.push_label(label);
    }

    pub fn pop_label(&mut self) -> Label {
        self.labels.pop_label()
    }

    // --- register arithmetic ----------------------------------------

    pub fn load_constant(&mut self, reg: Reg, value: u64) {
        arith::load_constant(&mut self.code, reg, value);
    }

    pub fn multiply(&mut self, dest: Reg, lhs: Reg, rhs: Reg) {
        arith::multiply(&mut self.code, &mut self.labels, dest, lhs, rhs);
    }

    pub fn divide(&mut self, dividend: Reg, divisor: Reg) {
        arith::divide(&mut self.code, &mut self.labels, dividend, divisor);
    }

    pub fn compare_equal(&mut self, lhs: Reg, rhs: Reg) {
        arith::compare_equal(&mut self.code, lhs, rhs);
    }

    // --- scopes and symbols -----------------------------------------

    pub fn enter_scope(&mut self) {
        self.symbols.enter_scope();
    }

    pub fn leave_scope(&mut self) {
        self.symbols.leave_scope();
        self.procedures.clear_current();
    }

    pub fn declare_variable(&mut self, name: &str) -> Result<Address, CompilerError> {
        self.symbols.declare_variable(&mut self.memory, name)
    }

    pub fn declare_array(
        &mut self,
        name: &str,
        start: Address,
        end: Address,
    ) -> Result<Address, CompilerError> {
        self.symbols.declare_array(&mut self.memory, name, start, end)
    }

    /// Declare a formal of the procedure currently being generated; the
    /// symbol is also copied into the registry's parameter list.
    pub fn declare_parameter(
        &mut self,
        name: &str,
        mode: ParamMode,
    ) -> Result<Address, CompilerError> {
        let symbol = self.symbols.declare_parameter(&mut self.memory, name, mode)?;
        let address = symbol.address;
        self.procedures.attach_parameter(symbol);
        Ok(address)
    }

    pub fn resolve_scalar(&self, name: &str) -> Result<Address, CompilerError> {
        self.symbols.resolve_scalar(name)
    }

    pub fn resolve_array_base(&self, name: &str) -> Result<Address, CompilerError> {
        self.symbols.resolve_array_base(name)
    }

    pub fn resolve_element(&self, name: &str, index: Address) -> Result<Address, CompilerError> {
        self.symbols.resolve_element(name, index)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.symbol(name)
    }

    /// Record that `name` now holds a value. Arrays are a no-op; for
    /// parameters the flag also lands in the owning procedure's
    /// persistent map so it survives scope teardown.
    pub fn mark_initialized(&mut self, name: &str) -> Result<(), CompilerError> {
        let symbol = self
            .symbols
            .symbol_mut(name)
            .ok_or_else(|| CompilerError::UndeclaredName(name.to_string()))?;
        if symbol.is_array() {
            return Ok(());
        }
        let is_parameter = symbol.is_parameter();
        symbol.initialized = true;
        if is_parameter {
            self.procedures.mark_param_initialized(name);
        }
        Ok(())
    }

    // --- procedures -------------------------------------------------

    pub fn declare_procedure(
        &mut self,
        name: &str,
        entry_label: Label,
    ) -> Result<Address, CompilerError> {
        self.procedures.declare(&mut self.memory, name, entry_label)
    }

    pub fn procedure_entry(&self, name: &str) -> Result<Label, CompilerError> {
        self.procedures.entry_label(name)
    }

    pub fn procedure_parameters(&self, name: &str) -> Result<&[Symbol], CompilerError> {
        self.procedures.parameters(name)
    }

    pub fn current_procedure(&self) -> Option<&str> {
        self.procedures.current()
    }

    pub fn return_address_slot(&self) -> Address {
        self.procedures.return_address_slot()
    }

    pub fn validate_call(&self, name: &str, arguments: &[&str]) -> Result<(), CompilerError> {
        self.procedures.validate_call(name, arguments, &self.symbols)
    }

    pub fn propagate_initialization(
        &mut self,
        procedure: &str,
        parameter: &str,
        argument: &str,
    ) -> Result<bool, CompilerError> {
        if self.symbols.symbol(argument).is_none() {
            return Err(CompilerError::UndeclaredName(argument.to_string()));
        }
        self.procedures
            .propagate_initialization(procedure, parameter, argument)
    }

    // --- FOR loops --------------------------------------------------

    pub fn open_loop(
        &mut self,
        iterator: &str,
        descending: bool,
    ) -> Result<&mut ForLoop, CompilerError> {
        self.loops
            .open(&mut self.symbols, &mut self.memory, iterator, descending)
    }

    pub fn current_loop(&self) -> Option<&ForLoop> {
        self.loops.current()
    }

    pub fn current_loop_mut(&mut self) -> Option<&mut ForLoop> {
        self.loops.current_mut()
    }

    pub fn close_loop(&mut self) {
        self.loops.close(&mut self.symbols);
    }

    // --- teardown ---------------------------------------------------

    /// End the compilation: verify that every referenced label was
    /// defined and hand the instruction stream to the caller.
    pub fn finalize(self) -> Result<Vec<String>, CompilerError> {
        self.labels.finalize()?;
        log::debug!(
            "generation complete: {} instructions, {} memory cells",
            self.code.position(),
            self.memory.used()
        );
        Ok(self.code.into_lines())
    }
}

#[cfg(test)]
#[path = "codegen_tests.rs"]
mod tests;
