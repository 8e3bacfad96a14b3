// Scoped Symbol Table
//
// A stack of name-to-symbol mappings nesting exactly with the source
// block/procedure structure. Leaving a scope discards its mapping but
// never its addresses; those were handed out by the flat allocator and
// stay reserved forever.

use indexmap::IndexMap;

use crate::error::CompilerError;
use crate::memory::{Address, MemoryAllocator};

/// Parameter passing mode of a procedure formal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Plain by-reference scalar.
    Scalar,
    /// Read-only at the call site.
    Constant,
    /// Initially undefined; the procedure is expected to produce it.
    Output,
    /// Array passed as a base pointer plus a start-index slot.
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Scalar,
    Array { start: Address, end: Address },
    Parameter(ParamMode),
}

/// Compile-time metadata of one declared name.
///
/// For parameters the stored address is a pointer cell to be dereferenced
/// at runtime; honoring that indirection is the caller's contract, the
/// table does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: Address,
    pub kind: SymbolKind,
    pub initialized: bool,
    /// FOR-loop iterator; the frontend rejects assignments to these.
    pub iterator: bool,
}

impl Symbol {
    /// Arrays and array-mode parameters alike.
    pub fn is_array(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Array { .. } | SymbolKind::Parameter(ParamMode::Array)
        )
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, SymbolKind::Parameter(_))
    }
}

/// Stack of lexical scopes. Names are looked up in the active (innermost)
/// scope only: the source language has no nested procedures, so a scope
/// owns every name visible inside it.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<IndexMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { scopes: Vec::new() }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(IndexMap::new());
        log::debug!("entered scope (depth {})", self.scopes.len());
    }

    /// Discard the active scope's mapping. The addresses it allocated stay
    /// reserved.
    pub fn leave_scope(&mut self) {
        if self.scopes.pop().is_none() {
            panic!("COMPILER BUG: leave_scope with no open scope");
        }
        log::debug!("left scope (depth {})", self.scopes.len());
    }

    fn active_scope(&self) -> &IndexMap<String, Symbol> {
        match self.scopes.last() {
            Some(scope) => scope,
            None => panic!("COMPILER BUG: symbol operation with no open scope"),
        }
    }

    fn active_scope_mut(&mut self) -> &mut IndexMap<String, Symbol> {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => panic!("COMPILER BUG: symbol operation with no open scope"),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.active_scope().contains_key(name)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.active_scope().get(name)
    }

    pub fn symbol_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.active_scope_mut().get_mut(name)
    }

    fn insert(&mut self, symbol: Symbol) -> Result<(), CompilerError> {
        if self.exists(&symbol.name) {
            return Err(CompilerError::DuplicateDeclaration(symbol.name));
        }
        self.active_scope_mut().insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Declare a scalar variable in the active scope.
    pub fn declare_variable(
        &mut self,
        memory: &mut MemoryAllocator,
        name: &str,
    ) -> Result<Address, CompilerError> {
        if self.exists(name) {
            return Err(CompilerError::DuplicateDeclaration(name.to_string()));
        }
        let address = memory.allocate(1, name)?;
        self.insert(Symbol {
            name: name.to_string(),
            address,
            kind: SymbolKind::Scalar,
            initialized: false,
            iterator: false,
        })?;
        Ok(address)
    }

    /// Declare an array over the inclusive index range `[start, end]`,
    /// reserving one cell per element.
    pub fn declare_array(
        &mut self,
        memory: &mut MemoryAllocator,
        name: &str,
        start: Address,
        end: Address,
    ) -> Result<Address, CompilerError> {
        if start > end {
            return Err(CompilerError::InvalidRange {
                array: name.to_string(),
                start,
                end,
            });
        }
        if self.exists(name) {
            return Err(CompilerError::DuplicateDeclaration(name.to_string()));
        }
        let address = memory.allocate(end - start + 1, name)?;
        self.insert(Symbol {
            name: name.to_string(),
            address,
            kind: SymbolKind::Array { start, end },
            initialized: true,
            iterator: false,
        })?;
        Ok(address)
    }

    /// Declare a procedure parameter. Array parameters reserve a second
    /// cell, the slot the caller passes the array's start index through.
    pub fn declare_parameter(
        &mut self,
        memory: &mut MemoryAllocator,
        name: &str,
        mode: ParamMode,
    ) -> Result<Symbol, CompilerError> {
        if self.exists(name) {
            return Err(CompilerError::DuplicateDeclaration(name.to_string()));
        }
        let cells = match mode {
            ParamMode::Array => 2,
            _ => 1,
        };
        let address = memory.allocate(cells, name)?;
        let symbol = Symbol {
            name: name.to_string(),
            address,
            kind: SymbolKind::Parameter(mode),
            initialized: false,
            iterator: false,
        };
        self.insert(symbol.clone())?;
        Ok(symbol)
    }

    /// Declare a FOR-loop iterator together with its hidden limit cell.
    /// Returns `(iterator_address, limit_address)`. The iterator counts as
    /// initialized: loop codegen stores the start value before the body.
    pub fn declare_iterator(
        &mut self,
        memory: &mut MemoryAllocator,
        name: &str,
    ) -> Result<(Address, Address), CompilerError> {
        if self.exists(name) {
            return Err(CompilerError::DuplicateDeclaration(name.to_string()));
        }
        let address = memory.allocate(2, name)?;
        self.insert(Symbol {
            name: name.to_string(),
            address,
            kind: SymbolKind::Scalar,
            initialized: true,
            iterator: true,
        })?;
        Ok((address, address + 1))
    }

    /// Drop `name` from the active scope; used when a FOR loop's
    /// generation completes. The addresses stay reserved.
    pub fn remove(&mut self, name: &str) {
        self.active_scope_mut().shift_remove(name);
    }

    /// Address of a scalar (or non-array parameter) cell.
    pub fn resolve_scalar(&self, name: &str) -> Result<Address, CompilerError> {
        let symbol = self
            .symbol(name)
            .ok_or_else(|| CompilerError::UndeclaredName(name.to_string()))?;
        if symbol.is_array() {
            return Err(CompilerError::NotAScalar(name.to_string()));
        }
        Ok(symbol.address)
    }

    /// Base address of an array (or the pointer cell of an array
    /// parameter).
    pub fn resolve_array_base(&self, name: &str) -> Result<Address, CompilerError> {
        let symbol = self
            .symbol(name)
            .ok_or_else(|| CompilerError::UndeclaredName(name.to_string()))?;
        if !symbol.is_array() {
            return Err(CompilerError::NotAnArray(name.to_string()));
        }
        Ok(symbol.address)
    }

    /// Address of one array element for a constant index. Array
    /// parameters have no compile-time range; indexing them goes through
    /// the start-index slot at runtime, so reaching this path with one is
    /// a generator bug.
    pub fn resolve_element(&self, name: &str, index: Address) -> Result<Address, CompilerError> {
        let symbol = self
            .symbol(name)
            .ok_or_else(|| CompilerError::UndeclaredName(name.to_string()))?;
        match symbol.kind {
            SymbolKind::Array { start, end } => {
                if index < start || index > end {
                    return Err(CompilerError::IndexOutOfRange {
                        array: name.to_string(),
                        index,
                        start,
                        end,
                    });
                }
                Ok(symbol.address + (index - start))
            }
            SymbolKind::Parameter(ParamMode::Array) => panic!(
                "COMPILER BUG: constant-index resolution of array parameter '{}'",
                name
            ),
            _ => Err(CompilerError::NotAnArray(name.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "symbols_tests.rs"]
mod tests;
