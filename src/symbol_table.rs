//! Lexically scoped name resolution for the semantic analyzer (spec §3, §4.3).
//!
//! A simple stack of hash maps, per the design notes: no interning, scopes
//! pushed only at function-body entry (never for a bare control-flow
//! block), global scope is the permanent bottom of the stack.

use std::collections::HashMap;

use crate::ast::TypeTag;

#[derive(Clone, Debug, PartialEq)]
pub struct FuncSignature {
    pub params: Vec<TypeTag>,
    pub ret: Option<TypeTag>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SymbolEntry {
    Var(TypeTag),
    Func(FuncSignature),
}

pub struct SymbolTable {
    scopes: Vec<HashMap<String, SymbolEntry>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Mirrors the Python original's `exit_scope`, which refuses to pop past
    /// the global scope. A caller that pushed a scope must always pop it
    /// exactly once; this guard only prevents the stack invariant from being
    /// violated if that ever stops being true.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// `true` if `name` was not already present in the *current* scope.
    pub fn define(&mut self, name: &str, entry: SymbolEntry) -> bool {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.contains_key(name) {
            false
        } else {
            scope.insert(name.to_string(), entry);
            true
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> SymbolTable {
        SymbolTable::new()
    }
}
