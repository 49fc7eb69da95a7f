//! Nested-scope symbol tables.
//!
//! Entries live in an arena on the stack and are addressed by [`EntryId`],
//! the non-owning handle that tree nodes store. Names are lower-cased before
//! any table operation, so resolution is case-insensitive while token text
//! stays case-preserving.

use std::collections::HashMap;

/// Index of an entry in the stack's arena. Non-owning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupScope {
    /// Current nesting level only.
    Local,
    /// Innermost level outward, stopping at the first hit.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolTableKey {
    Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolAttribute {
    Variable,
}

#[derive(Debug)]
pub struct SymbolTableEntry {
    name: String,
    nesting_level: usize,
    line_numbers: Vec<usize>,
    attributes: HashMap<SymbolTableKey, SymbolAttribute>,
}

impl SymbolTableEntry {
    fn new(name: String, nesting_level: usize) -> Self {
        Self {
            name,
            nesting_level,
            line_numbers: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nesting level of the owning table.
    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    /// Source lines where the name was referenced, in order of appearance.
    pub fn line_numbers(&self) -> &[usize] {
        &self.line_numbers
    }

    pub fn append_line_number(&mut self, line_number: usize) {
        self.line_numbers.push(line_number);
    }

    pub fn set_attribute(&mut self, key: SymbolTableKey, attribute: SymbolAttribute) {
        self.attributes.insert(key, attribute);
    }

    pub fn get_attribute(&self, key: SymbolTableKey) -> Option<SymbolAttribute> {
        self.attributes.get(&key).copied()
    }
}

/// One lexical nesting level: a name → entry mapping plus a lazily
/// recomputed, name-sorted view.
#[derive(Debug)]
pub struct SymbolTable {
    nesting_level: usize,
    entries: HashMap<String, EntryId>,
    sorted: Vec<EntryId>,
    sorted_stale: bool,
}

impl SymbolTable {
    fn new(nesting_level: usize) -> Self {
        Self {
            nesting_level,
            entries: HashMap::new(),
            sorted: Vec::new(),
            sorted_stale: false,
        }
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, normalized_name: &str) -> Option<EntryId> {
        self.entries.get(normalized_name).copied()
    }

    /// Entry ids sorted by name. Recomputed only after the entry count
    /// actually changed.
    pub fn sorted_entries(&mut self) -> &[EntryId] {
        if self.sorted_stale {
            let mut pairs: Vec<(&String, EntryId)> =
                self.entries.iter().map(|(name, &id)| (name, id)).collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            self.sorted = pairs.into_iter().map(|(_, id)| id).collect();
            self.sorted_stale = false;
        }
        &self.sorted
    }
}

/// The per-parse stack of symbol tables. Always holds at least the level-0
/// table.
#[derive(Debug)]
pub struct SymbolTableStack {
    tables: Vec<SymbolTable>,
    entries: Vec<SymbolTableEntry>,
}

impl Default for SymbolTableStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTableStack {
    pub fn new() -> Self {
        Self {
            tables: vec![SymbolTable::new(0)],
            entries: Vec::new(),
        }
    }

    pub fn current_nesting_level(&self) -> usize {
        self.tables.len() - 1
    }

    pub fn local(&self) -> &SymbolTable {
        self.tables.last().expect("stack always has a level-0 table")
    }

    pub fn local_mut(&mut self) -> &mut SymbolTable {
        self.tables.last_mut().expect("stack always has a level-0 table")
    }

    pub fn push_level(&mut self) {
        let nesting_level = self.tables.len();
        self.tables.push(SymbolTable::new(nesting_level));
    }

    /// Drop the innermost table. The level-0 table is never popped; entries
    /// stay alive in the arena for any node that references them.
    pub fn pop_level(&mut self) {
        if self.tables.len() > 1 {
            self.tables.pop();
        }
    }

    /// Enter `name` into the current level. Entering an already-present name
    /// returns the existing entry unchanged.
    pub fn enter_local(&mut self, name: &str) -> EntryId {
        let name = normalize(name);
        let level = self.tables.len() - 1;
        if let Some(id) = self.tables[level].lookup(&name) {
            return id;
        }

        let id = EntryId(self.entries.len());
        self.entries.push(SymbolTableEntry::new(name.clone(), level));
        let table = &mut self.tables[level];
        table.entries.insert(name, id);
        table.sorted_stale = true;
        id
    }

    pub fn lookup_local(&self, name: &str) -> Option<EntryId> {
        self.local().lookup(&normalize(name))
    }

    pub fn lookup(&self, name: &str, scope: LookupScope) -> Option<EntryId> {
        let name = normalize(name);
        match scope {
            LookupScope::Local => self.local().lookup(&name),
            LookupScope::All => self
                .tables
                .iter()
                .rev()
                .find_map(|table| table.lookup(&name)),
        }
    }

    pub fn lookup_or_enter(&mut self, name: &str, scope: LookupScope) -> EntryId {
        self.lookup(name, scope)
            .unwrap_or_else(|| self.enter_local(name))
    }

    pub fn entry(&self, id: EntryId) -> &SymbolTableEntry {
        &self.entries[id.0]
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut SymbolTableEntry {
        &mut self.entries[id.0]
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_or_enter_is_idempotent() {
        let mut stack = SymbolTableStack::new();
        let first = stack.lookup_or_enter("count", LookupScope::All);
        let second = stack.lookup_or_enter("count", LookupScope::All);
        assert_eq!(first, second);

        let before = stack.local_mut().sorted_entries().len();
        stack.lookup_or_enter("count", LookupScope::All);
        assert_eq!(stack.local_mut().sorted_entries().len(), before);
    }

    #[test]
    fn names_resolve_case_insensitively() {
        let mut stack = SymbolTableStack::new();
        let upper = stack.enter_local("Alpha");
        let lower = stack.enter_local("alpha");
        assert_eq!(upper, lower);
        assert_eq!(stack.entry(upper).name(), "alpha");
        assert_eq!(stack.lookup("ALPHA", LookupScope::All), Some(upper));
    }

    #[test]
    fn whole_stack_lookup_is_innermost_first() {
        let mut stack = SymbolTableStack::new();
        let outer = stack.enter_local("x");
        stack.push_level();
        assert_eq!(stack.current_nesting_level(), 1);

        // Visible from the inner scope before shadowing...
        assert_eq!(stack.lookup("x", LookupScope::All), Some(outer));
        assert_eq!(stack.lookup("x", LookupScope::Local), None);

        // ...and the inner entry wins afterwards.
        let inner = stack.enter_local("x");
        assert_ne!(inner, outer);
        assert_eq!(stack.lookup("x", LookupScope::All), Some(inner));

        stack.pop_level();
        assert_eq!(stack.lookup("x", LookupScope::All), Some(outer));
    }

    #[test]
    fn level_zero_is_never_popped() {
        let mut stack = SymbolTableStack::new();
        stack.pop_level();
        assert_eq!(stack.current_nesting_level(), 0);
        stack.enter_local("still_here");
        assert_eq!(stack.local().len(), 1);
    }

    #[test]
    fn sorted_entries_are_name_ordered() {
        let mut stack = SymbolTableStack::new();
        for name in ["gamma", "alpha", "beta"] {
            stack.enter_local(name);
        }
        let ids = stack.local_mut().sorted_entries().to_vec();
        let names: Vec<&str> = ids.iter().map(|&id| stack.entry(id).name()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn line_numbers_accumulate_in_order() {
        let mut stack = SymbolTableStack::new();
        let id = stack.enter_local("x");
        stack.entry_mut(id).append_line_number(1);
        stack.entry_mut(id).append_line_number(1);
        stack.entry_mut(id).append_line_number(4);
        assert_eq!(stack.entry(id).line_numbers(), &[1, 1, 4]);
    }

    #[test]
    fn entry_attributes_round_trip() {
        let mut stack = SymbolTableStack::new();
        let id = stack.enter_local("x");
        assert_eq!(stack.entry(id).get_attribute(SymbolTableKey::Kind), None);
        stack
            .entry_mut(id)
            .set_attribute(SymbolTableKey::Kind, SymbolAttribute::Variable);
        assert_eq!(
            stack.entry(id).get_attribute(SymbolTableKey::Kind),
            Some(SymbolAttribute::Variable)
        );
    }
}
