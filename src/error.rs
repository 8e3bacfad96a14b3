// Compiler Error Handling

use std::fmt;

use crate::labels::Label;
use crate::memory::Address;

/// User-facing compilation errors.
///
/// Everything here is recoverable at the granularity of "abort this
/// compilation with a message"; the driving frontend is expected to catch
/// these, report them with source context, and stop. Generator bugs
/// (empty label-stack pop, register-role conflicts, patching past the
/// emitted stream) are not errors of this type: they panic with a
/// `COMPILER BUG:` message.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilerError {
    // Label and fixup errors
    DuplicateLabel(Label),
    UnresolvedLabels(Vec<(usize, Label)>), // (instruction position, label)

    // Declaration errors
    DuplicateDeclaration(String),
    DuplicateProcedure(String),
    InvalidRange {
        array: String,
        start: Address,
        end: Address,
    },
    OutOfMemory(String),

    // Resolution errors
    UndeclaredName(String),
    NotAScalar(String),
    NotAnArray(String),
    IndexOutOfRange {
        array: String,
        index: Address,
        start: Address,
        end: Address,
    },

    // Call-site errors
    UnknownProcedure(String),
    ArityMismatch {
        procedure: String,
        expected: usize,
        found: usize,
    },

    // IO errors (driver)
    IOError(String),
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompilerError::DuplicateLabel(label) => {
                write!(f, "Label {} is already defined", label)
            }
            CompilerError::UnresolvedLabels(pending) => {
                write!(f, "Unresolved jumps at end of generation:")?;
                for (position, label) in pending {
                    write!(f, " [instruction {} -> label {}]", position, label)?;
                }
                Ok(())
            }
            CompilerError::DuplicateDeclaration(name) => {
                write!(f, "Double declaration of '{}'", name)
            }
            CompilerError::DuplicateProcedure(name) => {
                write!(f, "Procedure '{}' is already declared", name)
            }
            CompilerError::InvalidRange { array, start, end } => {
                write!(
                    f,
                    "Start index of array '{}' greater than end index: {} > {}",
                    array, start, end
                )
            }
            CompilerError::OutOfMemory(name) => {
                write!(f, "Out of memory while allocating '{}'", name)
            }
            CompilerError::UndeclaredName(name) => {
                write!(f, "'{}' is not declared", name)
            }
            CompilerError::NotAScalar(name) => {
                write!(f, "'{}' is an array, not a variable", name)
            }
            CompilerError::NotAnArray(name) => {
                write!(f, "'{}' is a variable, not an array", name)
            }
            CompilerError::IndexOutOfRange {
                array,
                index,
                start,
                end,
            } => {
                write!(
                    f,
                    "Index {} not in range [{}, {}] of array '{}'",
                    index, start, end, array
                )
            }
            CompilerError::UnknownProcedure(name) => {
                write!(f, "Procedure '{}' is not declared", name)
            }
            CompilerError::ArityMismatch {
                procedure,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Wrong number of arguments for procedure '{}': expected {}, found {}",
                    procedure, expected, found
                )
            }
            CompilerError::IOError(msg) => {
                write!(f, "IO error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompilerError {}
