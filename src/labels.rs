// Label and Fixup Management
//
// Lets the generator emit forward jumps before their targets exist. A
// reference to an undefined label emits a placeholder instruction and
// records a fixup; defining the label backpatches every pending fixup in
// place. `finalize` verifies that nothing is left dangling.

use indexmap::IndexMap;

use crate::emit::{CodeEmitter, JumpOp};
use crate::error::CompilerError;

/// Opaque jump-target identifier, distinct from any code address.
pub type Label = u32;

/// A placeholder jump waiting for its label's address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    /// Position of the placeholder instruction in the stream.
    pub position: usize,
    pub label: Label,
    pub opcode: JumpOp,
}

/// Allocates labels, resolves or defers jump targets, and backpatches.
#[derive(Debug, Default)]
pub struct LabelManager {
    next_label: Label,
    addresses: IndexMap<Label, usize>,
    pending: Vec<Fixup>,
    stack: Vec<Label>,
}

impl LabelManager {
    pub fn new() -> Self {
        LabelManager {
            next_label: 0,
            addresses: IndexMap::new(),
            pending: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Return a fresh label; identifiers are strictly increasing and never
    /// reused.
    pub fn new_label(&mut self) -> Label {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Emit a jump to `label`. If the label already has an address the jump
    /// is emitted directly; otherwise a placeholder goes out and a fixup is
    /// recorded. Any number of references may precede the definition.
    pub fn reference(&mut self, code: &mut CodeEmitter, label: Label, opcode: JumpOp) {
        match self.addresses.get(&label) {
            Some(&address) => code.emit_jump(opcode, address),
            None => {
                let position = code.emit_jump_placeholder(opcode);
                self.pending.push(Fixup {
                    position,
                    label,
                    opcode,
                });
            }
        }
    }

    /// Fix `label` to the current instruction count and backpatch every
    /// pending fixup that targets it.
    pub fn define(&mut self, code: &mut CodeEmitter, label: Label) -> Result<(), CompilerError> {
        if self.addresses.contains_key(&label) {
            return Err(CompilerError::DuplicateLabel(label));
        }
        let address = code.position();
        self.addresses.insert(label, address);

        let mut patched = 0;
        self.pending.retain(|fixup| {
            if fixup.label == label {
                code.patch_jump(fixup.position, fixup.opcode, address);
                patched += 1;
                false
            } else {
                true
            }
        });
        log::debug!(
            "label {} defined at {} ({} fixups patched)",
            label,
            address,
            patched
        );
        Ok(())
    }

    /// Address of a defined label, if known.
    pub fn address_of(&self, label: Label) -> Option<usize> {
        self.addresses.get(&label).copied()
    }

    /// Verify that every referenced label was eventually defined. Called
    /// once at the end of a full compilation.
    pub fn finalize(&self) -> Result<(), CompilerError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut unresolved = Vec::with_capacity(self.pending.len());
        for fixup in &self.pending {
            if fixup.label >= self.next_label {
                panic!(
                    "COMPILER BUG: fixup at instruction {} targets label {} that was never allocated",
                    fixup.position, fixup.label
                );
            }
            unresolved.push((fixup.position, fixup.label));
        }
        Err(CompilerError::UnresolvedLabels(unresolved))
    }

    /// Remember a label across nested generation, e.g. the jump target to
    /// use once the current construct ends.
    pub fn push_label(&mut self, label: Label) {
        self.stack.push(label);
    }

    /// Take back the most recently pushed label.
    pub fn pop_label(&mut self) -> Label {
        match self.stack.pop() {
            Some(label) => label,
            None => panic!("COMPILER BUG: pop_label on empty label stack"),
        }
    }
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
