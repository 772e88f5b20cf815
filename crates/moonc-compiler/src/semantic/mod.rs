//! Semantic analysis: three AST visitors run in sequence (table building,
//! table checking, type checking), followed by a single offset-planning
//! pass over every table in the arena (§4.3).

pub(crate) mod offsets;
mod resolve;
mod table_builder;
mod table_check;
mod type_check;

use moonc_core::CompilationContext;

use crate::ast::{Ast, NodeId};
use crate::diagnostics::Diagnostics;

/// Runs the full semantic pipeline over a parsed `prog` node, returning the
/// diagnostics collected by Visitors 2 and 3 (Visitor 1 never reports:
/// everything it finds wrong is a Visitor 2 concern by construction).
///
/// `ctx` accumulates every symbol table this compilation produces; the
/// caller owns it so code generation can keep consulting it afterwards.
pub fn analyze(ctx: &mut CompilationContext, ast: &mut Ast, prog: NodeId) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    table_builder::build_tables(ctx, ast, prog);
    table_check::check_tables(ctx, ast, prog, &mut diagnostics);
    type_check::check_types(ctx, ast, prog, &mut diagnostics);
    offsets::assign_offsets(ctx);

    diagnostics
}
