// FOR-Loop Context Stack
//
// Bookkeeping for nested FOR loops while their code is being generated.
// Each open loop owns exactly one context, held by value in the stack;
// popping it is the only release step. The iterator symbol disappears
// with the context, its two memory cells do not.

use crate::error::CompilerError;
use crate::labels::Label;
use crate::memory::{Address, MemoryAllocator};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub iterator: String,
    pub iterator_address: Address,
    /// Hidden cell the loop's limit value is evaluated into.
    pub limit_address: Address,
    /// Back-edge target; filled in by loop codegen, not by this stack.
    pub entry_label: Option<Label>,
    /// Exit target; filled in by loop codegen.
    pub exit_label: Option<Label>,
    /// DOWNTO rather than TO.
    pub descending: bool,
}

#[derive(Debug, Default)]
pub struct LoopStack {
    stack: Vec<ForLoop>,
}

impl LoopStack {
    pub fn new() -> Self {
        LoopStack { stack: Vec::new() }
    }

    /// Declare `iterator` with its hidden limit cell and push a context
    /// for the loop under construction.
    pub fn open(
        &mut self,
        symbols: &mut SymbolTable,
        memory: &mut MemoryAllocator,
        iterator: &str,
        descending: bool,
    ) -> Result<&mut ForLoop, CompilerError> {
        let (iterator_address, limit_address) = symbols.declare_iterator(memory, iterator)?;
        self.stack.push(ForLoop {
            iterator: iterator.to_string(),
            iterator_address,
            limit_address,
            entry_label: None,
            exit_label: None,
            descending,
        });
        Ok(self.stack.last_mut().expect("just pushed"))
    }

    /// The innermost open loop.
    pub fn current(&self) -> Option<&ForLoop> {
        self.stack.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut ForLoop> {
        self.stack.last_mut()
    }

    /// Pop the finished loop and drop its iterator from the active scope.
    pub fn close(&mut self, symbols: &mut SymbolTable) {
        let info = match self.stack.pop() {
            Some(info) => info,
            None => panic!("COMPILER BUG: close_loop with no open loop"),
        };
        symbols.remove(&info.iterator);
        log::debug!("closed FOR loop over '{}'", info.iterator);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
#[path = "loops_tests.rs"]
mod tests;
