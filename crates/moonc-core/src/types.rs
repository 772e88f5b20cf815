//! The source language's type algebra: [`BaseType`] and [`SymbolType`].
//!
//! `BaseType` is interned by name: the four primitives are fixed, and every
//! class name resolves (through a [`crate::CompilationContext`]) to the
//! symbol table backing that class. `SymbolType` pairs a `BaseType` with an
//! ordered list of array dimensions.

use crate::{CompilationContext, Symbol};

/// A base type: one of the four primitives, or a class name.
///
/// Class types carry only the interned name; looking up the backing table
/// (and therefore the class's size) always goes through the
/// [`CompilationContext`] so a class's size can grow as its table fills in
/// during table-building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Integer,
    Float,
    Void,
    Boolean,
    Class(Symbol),
}

impl BaseType {
    pub fn is_class(self) -> bool {
        matches!(self, BaseType::Class(_))
    }

    pub fn class_name(self) -> Option<Symbol> {
        match self {
            BaseType::Class(sym) => Some(sym),
            _ => None,
        }
    }

    /// Size in bytes of one scalar value of this base type.
    ///
    /// Class size is "the current size of its table at the moment of
    /// query" (§3): it grows monotonically as the table builder inserts
    /// data members, so two calls during table-building may disagree.
    pub fn size(self, ctx: &CompilationContext) -> u32 {
        match self {
            BaseType::Integer => 4,
            BaseType::Float => 8,
            BaseType::Void | BaseType::Boolean => 0,
            BaseType::Class(name) => ctx
                .class_table(name)
                .map(|table| table.current_size(ctx))
                .unwrap_or(0),
        }
    }

    pub fn name<'a>(self, ctx: &'a CompilationContext) -> &'a str {
        match self {
            BaseType::Integer => "integer",
            BaseType::Float => "float",
            BaseType::Void => "void",
            BaseType::Boolean => "boolean",
            BaseType::Class(sym) => ctx.interner.resolve(sym),
        }
    }
}

/// A base type plus an ordered list of array dimensions.
///
/// A dimension of `None` means "unspecified size", which the grammar only
/// allows on parameter declarations (`integer a[][]`). `is_complex` is true
/// for any array (even zero-dimensional... no: any *non-empty* dims list)
/// or a class-typed value; complex values are passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolType {
    pub base: BaseType,
    pub dims: Vec<Option<u32>>,
}

impl SymbolType {
    pub fn scalar(base: BaseType) -> Self {
        Self {
            base,
            dims: Vec::new(),
        }
    }

    pub fn is_complex(&self) -> bool {
        !self.dims.is_empty() || self.base.is_class()
    }

    pub fn arity(&self) -> usize {
        self.dims.len()
    }

    /// `size = ∏(specified dims) × base.size`. Unspecified dims (parameter
    /// declarations) contribute a factor of 1 — parameters never own
    /// storage for their array payload, only a pointer slot.
    pub fn size(&self, ctx: &CompilationContext) -> u32 {
        let dim_product: u32 = self.dims.iter().filter_map(|d| *d).product();
        let dim_product = if self.dims.iter().all(|d| d.is_none()) && !self.dims.is_empty() {
            1
        } else {
            dim_product.max(1)
        };
        dim_product * self.base.size(ctx)
    }

    /// Partial product of dims after index `i`, used to compute the
    /// row-major displacement for array indexing: `mul_for_dim(i) =
    /// ∏(dims after i) × base.size`.
    pub fn mul_for_dim(&self, i: usize, ctx: &CompilationContext) -> u32 {
        let trailing: u32 = self.dims[i + 1..].iter().filter_map(|d| *d).product();
        let trailing = if trailing == 0 { 1 } else { trailing };
        trailing * self.base.size(ctx)
    }

    /// Structural equality used for overload matching: same base type and
    /// same number of dimensions (dimension *sizes* never participate in
    /// type compatibility, only arity does).
    pub fn matches_shape(&self, other: &SymbolType) -> bool {
        self.base == other.base && self.dims.len() == other.dims.len()
    }
}
