//! Per-class / per-function symbol tables, chained through inheritance.

use indexmap::IndexMap;

use crate::record::RecordKind;
use crate::{BaseType, CompilationContext, Record, Symbol, Visibility};

/// Index of a [`SymbolTable`] in a [`CompilationContext`]'s table arena.
///
/// Tables reference each other (inheritance, nested function/class tables)
/// only through these ids, never through borrows or `Rc` — per §9, this
/// keeps the symbol graph name-keyed instead of a graph of references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u32);

impl TableId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// The well-known id of the globals table (always arena slot 0).
    pub fn globals() -> Self {
        Self(0)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub name: String,
    pub inherits: Vec<BaseType>,
    pub is_function: bool,
    pub(crate) is_globals: bool,
    entries: IndexMap<Symbol, Vec<Record>>,
}

impl SymbolTable {
    pub(crate) fn new(name: impl Into<String>, is_globals: bool) -> Self {
        Self {
            name: name.into(),
            inherits: Vec::new(),
            is_function: false,
            is_globals,
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, record: Record) {
        self.entries.entry(record.name).or_default().push(record);
    }

    pub fn get(&self, name: Symbol) -> &[Record] {
        self.entries.get(&name).map_or(&[], |v| v.as_slice())
    }

    pub fn get_mut(&mut self, name: Symbol) -> Option<&mut Vec<Record>> {
        self.entries.get_mut(&name)
    }

    /// All records across all names, in insertion order (a name's own
    /// overloads stay grouped and ordered within that). Used by the offset
    /// planner, which must assign ascending offsets by insertion order.
    pub fn entries_in_order(&self) -> impl Iterator<Item = &Record> {
        self.entries.values().flatten()
    }

    pub fn entries_in_order_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.entries.values_mut().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.entries.keys().copied()
    }

    /// `search_member(name, visibility)`: local entries (filtered by
    /// visibility) then parents, recursively.
    pub fn search_member(
        &self,
        ctx: &CompilationContext,
        name: Symbol,
        visibility: Visibility,
    ) -> Vec<Record> {
        let mut found: Vec<Record> = self
            .get(name)
            .iter()
            .filter(|r| matches!(visibility, Visibility::Private) || r.visibility == Some(Visibility::Public))
            .cloned()
            .collect();

        for parent in &self.inherits {
            if let Some(parent_table) = ctx.class_table_of(*parent) {
                // "Access to a parent is private if this table's name starts
                // with `parent.name + \"::\"`, else public" (§3): a method
                // table named `Class::method` gets private access to its
                // own class's members; ordinary derived-class access to an
                // ancestor only ever sees the ancestor's public members.
                let parent_visibility = if self.name.starts_with(&format!("{}::", parent_table.name)) {
                    Visibility::Private
                } else {
                    Visibility::Public
                };
                found.extend(parent_table.search_member(ctx, name, parent_visibility));
            }
        }
        found
    }

    /// `search_in_scope(name)`: `search_member(name, private)` combined
    /// with the globals lookup. The globals table overrides this with a
    /// direct local lookup to avoid infinite recursion into itself.
    pub fn search_in_scope(&self, ctx: &CompilationContext, name: Symbol) -> Vec<Record> {
        if self.is_globals {
            return self.get(name).to_vec();
        }
        let mut found = self.search_member(ctx, name, Visibility::Private);
        found.extend(ctx.globals().get(name).iter().cloned());
        found
    }

    /// The current total size of this table's data-member storage,
    /// including inherited data members. Used to resolve a class's
    /// `BaseType::size` while the table is still being built.
    pub fn current_size(&self, ctx: &CompilationContext) -> u32 {
        let inherited: u32 = self
            .inherits
            .iter()
            .filter_map(|bt| ctx.class_table_of(*bt))
            .map(|t| t.current_size(ctx))
            .sum();
        let own: u32 = self
            .entries_in_order()
            .filter(|r| r.kind == RecordKind::Data)
            .map(|r| r.ty.size(ctx))
            .sum();
        inherited + own
    }
}
