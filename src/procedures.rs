// Procedure Registry
//
// Maps procedure names to their linkage metadata: the memory slot the
// call sequence stores the return address in, the entry label, the
// ordered parameter list, and a per-name initialization map that survives
// the declaration scope's teardown. The initialization maps implement a
// flow-insensitive, call-graph-propagated "may be initialized"
// approximation: flags are only ever set, never cleared, and branches are
// not considered.

use indexmap::IndexMap;

use crate::error::CompilerError;
use crate::labels::Label;
use crate::memory::{Address, MemoryAllocator};
use crate::symbols::{Symbol, SymbolTable};

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    /// Memory cell the call sequence stores the return address in.
    pub return_address: Address,
    /// Label of the procedure's first instruction.
    pub entry_label: Label,
    /// Formals in declaration order, copied out of the declaration scope
    /// before that scope is torn down.
    pub parameters: Vec<Symbol>,
    /// Which names are known to hold a value by the end of the body.
    pub initialized: IndexMap<String, bool>,
}

#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    procedures: IndexMap<String, Procedure>,
    current: Option<String>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        ProcedureRegistry {
            procedures: IndexMap::new(),
            current: None,
        }
    }

    /// Register a procedure, reserve its return-address slot, and make it
    /// the current procedure for subsequent parameter declarations.
    pub fn declare(
        &mut self,
        memory: &mut MemoryAllocator,
        name: &str,
        entry_label: Label,
    ) -> Result<Address, CompilerError> {
        if self.procedures.contains_key(name) {
            return Err(CompilerError::DuplicateProcedure(name.to_string()));
        }
        let return_address = memory.allocate(1, name)?;
        self.procedures.insert(
            name.to_string(),
            Procedure {
                name: name.to_string(),
                return_address,
                entry_label,
                parameters: Vec::new(),
                initialized: IndexMap::new(),
            },
        );
        self.current = Some(name.to_string());
        log::debug!(
            "declared procedure '{}' (entry label {}, return slot {})",
            name,
            entry_label,
            return_address
        );
        Ok(return_address)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Name of the procedure whose body is being generated, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Generation left the procedure's scope.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    fn current_procedure_mut(&mut self) -> &mut Procedure {
        let name = match &self.current {
            Some(name) => name,
            None => panic!("COMPILER BUG: procedure operation outside any procedure"),
        };
        self.procedures
            .get_mut(name)
            .expect("COMPILER BUG: current procedure missing from registry")
    }

    /// Append a freshly declared formal to the current procedure and seed
    /// its initialization flag.
    pub fn attach_parameter(&mut self, symbol: Symbol) {
        let procedure = self.current_procedure_mut();
        procedure.initialized.insert(symbol.name.clone(), false);
        procedure.parameters.push(symbol);
    }

    pub fn entry_label(&self, name: &str) -> Result<Label, CompilerError> {
        self.procedures
            .get(name)
            .map(|p| p.entry_label)
            .ok_or_else(|| CompilerError::UnknownProcedure(name.to_string()))
    }

    pub fn parameters(&self, name: &str) -> Result<&[Symbol], CompilerError> {
        self.procedures
            .get(name)
            .map(|p| p.parameters.as_slice())
            .ok_or_else(|| CompilerError::UnknownProcedure(name.to_string()))
    }

    /// Return-address slot of the current procedure; used when emitting
    /// its epilogue.
    pub fn return_address_slot(&self) -> Address {
        let name = match &self.current {
            Some(name) => name,
            None => panic!("COMPILER BUG: return-address query outside any procedure"),
        };
        self.procedures[name].return_address
    }

    /// Check a call site: the procedure must exist, the argument count
    /// must match the declared parameter count, and every argument name
    /// must be visible in the active scope. Parameter-mode rules
    /// (constant/output) are left to the frontend.
    pub fn validate_call(
        &self,
        name: &str,
        arguments: &[&str],
        symbols: &SymbolTable,
    ) -> Result<(), CompilerError> {
        let procedure = self
            .procedures
            .get(name)
            .ok_or_else(|| CompilerError::UnknownProcedure(name.to_string()))?;
        if procedure.parameters.len() != arguments.len() {
            return Err(CompilerError::ArityMismatch {
                procedure: name.to_string(),
                expected: procedure.parameters.len(),
                found: arguments.len(),
            });
        }
        for argument in arguments {
            if symbols.symbol(argument).is_none() {
                return Err(CompilerError::UndeclaredName(argument.to_string()));
            }
        }
        Ok(())
    }

    /// Set `name`'s flag in the current procedure's persistent map, so the
    /// initialization survives the scope teardown and stays visible to
    /// later callers.
    pub fn mark_param_initialized(&mut self, name: &str) {
        self.current_procedure_mut()
            .initialized
            .insert(name.to_string(), true);
    }

    /// Whether `parameter` is marked initialized in `procedure`'s map; if
    /// so, and generation is inside a procedure body, the caller's
    /// `argument` name is marked in that procedure's own map.
    pub fn propagate_initialization(
        &mut self,
        procedure: &str,
        parameter: &str,
        argument: &str,
    ) -> Result<bool, CompilerError> {
        let is_initialized = self
            .procedures
            .get(procedure)
            .ok_or_else(|| CompilerError::UnknownProcedure(procedure.to_string()))?
            .initialized
            .get(parameter)
            .copied()
            .unwrap_or(false);
        if is_initialized && self.current.is_some() {
            self.current_procedure_mut()
                .initialized
                .insert(argument.to_string(), true);
        }
        Ok(is_initialized)
    }
}

#[cfg(test)]
#[path = "procedures_tests.rs"]
mod tests;
