//! Symbol table entries.

use crate::symbol_table::TableId;
use crate::{CompilationContext, Location, Symbol, SymbolType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Class,
    Data,
    Function,
    Param,
    Local,
    Temp,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordKind::Class => "class",
            RecordKind::Data => "data",
            RecordKind::Function => "function",
            RecordKind::Param => "param",
            RecordKind::Local => "local",
            RecordKind::Temp => "temp",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        };
        write!(f, "{s}")
    }
}

/// A lightweight (name, type) pair used for function overload matching.
///
/// Kept separate from `Record` so a function's signature can be compared
/// without cloning the full param records (whose own `table` back-link
/// would otherwise need deep-cloning too).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSig {
    pub name: Symbol,
    pub ty: SymbolType,
}

/// An entry in a [`crate::SymbolTable`].
#[derive(Debug, Clone)]
pub struct Record {
    pub name: Symbol,
    pub ty: SymbolType,
    pub kind: RecordKind,
    pub location: Location,
    /// Function records only: the declared parameter signature, in order.
    pub params: Option<Vec<ParamSig>>,
    /// `data` and `member function declaration` records only.
    pub visibility: Option<Visibility>,
    /// Nested table: classes and function definitions.
    pub table: Option<TableId>,
    /// Byte offset relative to the enclosing frame/record. `None` until
    /// the offset planner runs.
    pub offset: Option<i32>,
}

impl Record {
    pub fn new(name: Symbol, ty: SymbolType, kind: RecordKind, location: Location) -> Self {
        Self {
            name,
            ty,
            kind,
            location,
            params: None,
            visibility: None,
            table: None,
            offset: None,
        }
    }

    /// `is_pointer = (record kind is param AND type is_complex)` (§3).
    pub fn is_pointer(&self) -> bool {
        self.kind == RecordKind::Param && self.ty.is_complex()
    }

    /// Bytes this record occupies in its frame. Complex *parameters* only
    /// ever reserve a pointer-sized slot; everything else reserves its full
    /// type size. Class and function records (not values) occupy zero.
    pub fn storage_size(&self, ctx: &CompilationContext) -> u32 {
        match self.kind {
            RecordKind::Class | RecordKind::Function => 0,
            RecordKind::Param if self.ty.is_complex() => 4,
            _ => self.ty.size(ctx),
        }
    }

    pub fn memory_location(&self) -> String {
        let offset = self.offset.unwrap_or(0);
        format!("{}(r14)", -offset)
    }
}
