use indexmap::IndexMap;
use std::fmt;

use super::symbol::{Symbol, SymbolKind};
use super::ScopeId;

/// A single scope in the scope tree. Symbols are kept in insertion order so
/// parameter lists and table dumps are deterministic.
#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    symbols: IndexMap<String, Symbol>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>) -> Self {
        Scope {
            id,
            parent,
            children: Vec::new(),
            symbols: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// SymbolTable is the nested scope tree shared by the three passes.
///
/// The tree is stored as an arena indexed by `ScopeId`; parent links are
/// plain indices, so no ownership cycles exist. The analyser builds the tree
/// with `add_child_scope`/`set_parent_as_current`, assigning ids in creation
/// order. The IR generator then replays the very same tree with
/// `reset_walk`/`enter`/`exit`: an `exit` advances the child cursor of the
/// parent, so successive `enter` calls visit sibling scopes in the order the
/// analyser created them. Both passes must therefore visit scope-creating
/// constructs in identical order.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
    cursors: Vec<usize>,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(0, None)],
            current: 0,
            cursors: vec![0],
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Place a symbol in the current scope, stamping its label with the
    /// scope-qualified prefix. Fails silently on a duplicate name; callers
    /// are expected to check first.
    pub fn insert(&mut self, mut symbol: Symbol) {
        symbol.label = format!("{}_", self.current);
        let scope = &mut self.scopes[self.current];
        if !scope.symbols.contains_key(&symbol.name) {
            scope.symbols.insert(symbol.name.clone(), symbol);
        }
    }

    /// Find a symbol in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].symbols.get(name)
    }

    /// Find a symbol in the current scope or any parent scope up to global.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(symbol) = self.scopes[id].symbols.get(name) {
                return Some(symbol);
            }
            scope = self.scopes[id].parent;
        }
        None
    }

    /// Resolve a property of a class, walking up the inheritance chain when
    /// the defining class does not declare it.
    pub fn get_property(&self, class_name: &str, property_name: &str) -> Option<&Symbol> {
        let class_symbol = self.lookup(class_name)?;
        if class_symbol.kind != SymbolKind::Class {
            return None;
        }
        let definition = class_symbol.definition?;
        match self.scopes[definition].symbols.get(property_name) {
            Some(property) => Some(property),
            None if !class_symbol.parent.is_empty() => {
                self.get_property(&class_symbol.parent, property_name)
            }
            None => None,
        }
    }

    /// Overwrite a symbol in the nearest scope containing `name`, keeping
    /// the stamped label of that scope.
    pub fn update(&mut self, name: &str, mut symbol: Symbol) -> bool {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(existing) = self.scopes[id].symbols.get(name) {
                symbol.label = existing.label.clone();
                self.scopes[id].symbols.insert(name.to_string(), symbol);
                return true;
            }
            scope = self.scopes[id].parent;
        }
        false
    }

    /// First-pass construction: create a child of the current scope with the
    /// next monotonically increasing id, and descend into it.
    pub fn add_child_scope(&mut self) {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, Some(self.current)));
        let parent = self.current;
        self.scopes[parent].children.push(id);
        self.current = id;
    }

    /// First-pass construction: ascend to the parent scope.
    pub fn set_parent_as_current(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Start a second-pass replay of the already-built tree from global.
    pub fn reset_walk(&mut self) {
        self.current = 0;
        self.cursors = vec![0];
    }

    /// Second-pass replay: descend into the next unvisited child.
    pub fn enter(&mut self) {
        let cursor = *self.cursors.last().expect("walk not started");
        let child = self.scopes[self.current].children[cursor];
        self.cursors.push(0);
        self.current = child;
    }

    /// Second-pass replay: ascend, advancing the parent's child cursor so a
    /// following `enter` visits the next sibling.
    pub fn exit(&mut self) {
        self.cursors.pop();
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
        if let Some(cursor) = self.cursors.last_mut() {
            *cursor += 1;
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

/// Scope dump used by `-print-tables`: one indented block per scope, one
/// line per symbol, in insertion order.
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn print_scope(
            table: &SymbolTable,
            f: &mut fmt::Formatter<'_>,
            id: ScopeId,
            depth: usize,
        ) -> fmt::Result {
            let indent = "\t".repeat(depth);
            let indent_plus = "\t".repeat(depth + 1);

            writeln!(f, "{}scope {} {{", indent, id)?;
            for symbol in table.scopes[id].symbols.values() {
                writeln!(
                    f,
                    "{}{} {:?} {} size={} dims={:?} offset={} parent='{}' value='{}'",
                    indent_plus,
                    symbol.name,
                    symbol.kind,
                    symbol.data_type,
                    symbol.size,
                    symbol.dimensions,
                    symbol.offset,
                    symbol.parent,
                    symbol.value,
                )?;
            }
            for &child in &table.scopes[id].children {
                print_scope(table, f, child, depth + 1)?;
            }
            writeln!(f, "{}}}", indent)
        }

        print_scope(self, f, 0, 0)
    }
}
