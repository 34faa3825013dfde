//! Handle for the output of a command.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::model::Argument;

/// Output of the command at `index`.
///
/// Use it whole through [`TransactionResult::arg`] (or `Argument::from`), or
/// destructure a multi-value output with [`TransactionResult::nested`].
/// The number of nested values is not known up front; each slot is created
/// on first access and cached afterwards.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    index: u16,
    nested: RefCell<BTreeMap<u16, Argument>>,
}

impl TransactionResult {
    pub(crate) fn new(index: u16) -> Self {
        Self {
            index,
            nested: RefCell::new(BTreeMap::new()),
        }
    }

    /// Index of the command that produces this result.
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn arg(&self) -> Argument {
        Argument::Result(self.index)
    }

    pub fn nested(&self, sub_index: u16) -> Argument {
        *self
            .nested
            .borrow_mut()
            .entry(sub_index)
            .or_insert(Argument::NestedResult(self.index, sub_index))
    }

    /// First `N` nested values, e.g. `let [a, b] = result.destructure();`.
    pub fn destructure<const N: usize>(&self) -> [Argument; N] {
        std::array::from_fn(|i| self.nested(i as u16))
    }

    /// Number of nested slots accessed so far.
    pub fn materialized(&self) -> usize {
        self.nested.borrow().len()
    }
}

impl From<&TransactionResult> for Argument {
    fn from(result: &TransactionResult) -> Self {
        result.arg()
    }
}

impl From<TransactionResult> for Argument {
    fn from(result: TransactionResult) -> Self {
        result.arg()
    }
}
