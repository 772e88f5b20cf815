//! Shared type-resolution helpers used by the table builder and type checker.

use moonc_core::{BaseType, CompilationContext, SymbolType};

use crate::ast::{Ast, NodeId, NodeKind};

/// Resolves a `Type` leaf's token text to a `BaseType`, interning class
/// names as needed.
pub(crate) fn base_type_of(ctx: &mut CompilationContext, ast: &Ast, type_node: NodeId) -> BaseType {
    let text = ast
        .get(type_node)
        .token
        .as_ref()
        .map(|t| t.lexeme.as_str())
        .unwrap_or("");
    match text {
        "integer" => BaseType::Integer,
        "float" => BaseType::Float,
        _ => BaseType::Class(ctx.interner.intern(text)),
    }
}

/// Resolves a `dim_list` node (each child a `Literal` or `Epsilon`) to the
/// `SymbolType::dims` shape: `Some(n)` for a literal size, `None` for an
/// unspecified one (parameter declarations never carry a literal).
pub(crate) fn dims_of(ast: &Ast, dim_list: NodeId) -> Vec<Option<u32>> {
    ast.children(dim_list)
        .iter()
        .map(|&child| match ast.get(child).kind {
            NodeKind::Literal => ast
                .get(child)
                .token
                .as_ref()
                .and_then(|t| t.lexeme.parse::<u32>().ok()),
            _ => None,
        })
        .collect()
}

pub(crate) fn symbol_type_of(ctx: &mut CompilationContext, ast: &Ast, type_node: NodeId, dim_list: NodeId) -> SymbolType {
    SymbolType {
        base: base_type_of(ctx, ast, type_node),
        dims: dims_of(ast, dim_list),
    }
}

pub(crate) fn id_text<'a>(ast: &'a Ast, id_node: NodeId) -> &'a str {
    ast.get(id_node).token.as_ref().map(|t| t.lexeme.as_str()).unwrap_or("")
}

pub(crate) fn id_location(ast: &Ast, id_node: NodeId) -> moonc_core::Location {
    ast.get(id_node)
        .token
        .as_ref()
        .map(|t| t.location)
        .unwrap_or(moonc_core::Location::new(1, 1))
}
