//! Visitor 3: type checking (§4.3 "Type Check"). `TypeExtractor` walks an
//! expression subtree post-order, resolving each node's type against the
//! tables Visitors 1-2 built and inserting a temporary record wherever a
//! computed value needs somewhere to live.
//!
//! Boolean-valued expressions (relational and logical results) never get a
//! temp: `BaseType::Boolean` has zero size, so there is nothing for one to
//! hold — see DESIGN.md.

use moonc_core::{BaseType, CompilationContext, Record, RecordKind, SymbolType, TableId, Visibility};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::diagnostics::Diagnostics;
use crate::token::TokenKind;

use super::resolve::id_location;

/// Generates globally-unique symbols for inserted temporaries, so a
/// (table, symbol) pair always names exactly one record — no two temps
/// anywhere in a compilation ever share a name.
struct TempNames {
    counter: u32,
}

impl TempNames {
    fn new() -> Self {
        Self { counter: 0 }
    }

    fn next(&mut self, ctx: &mut CompilationContext) -> moonc_core::Symbol {
        let sym = ctx.interner.intern_owned(format!("%t{}", self.counter));
        self.counter += 1;
        sym
    }
}

pub fn check_types(ctx: &mut CompilationContext, ast: &mut Ast, prog: NodeId, diagnostics: &mut Diagnostics) {
    let mut temps = TempNames::new();
    let children = ast.children(prog).to_vec();
    let (func_list, main) = (children[1], children[2]);

    for func_def in ast.children(func_list).to_vec() {
        let Some(record) = ast.get(func_def).record.clone() else { continue };
        let Some(table) = record.table else { continue };
        let fd_children = ast.children(func_def).to_vec();
        let (ret, stat_block) = (fd_children[3], fd_children[5]);
        let ret_ty = if ast.get(ret).kind == NodeKind::Type { Some(record.ty.clone()) } else { None };
        check_stat_block(ctx, ast, table, stat_block, ret_ty.as_ref(), &mut temps, diagnostics);
    }

    let main_table = ast.get(main).record.as_ref().and_then(|r| r.table);
    if let Some(table) = main_table {
        let stat_block = ast.children(main)[1];
        check_stat_block(ctx, ast, table, stat_block, None, &mut temps, diagnostics);
    }
}

fn check_stat_block(
    ctx: &mut CompilationContext,
    ast: &mut Ast,
    scope: TableId,
    stat_block: NodeId,
    ret_ty: Option<&SymbolType>,
    temps: &mut TempNames,
    diagnostics: &mut Diagnostics,
) {
    for stat in ast.children(stat_block).to_vec() {
        check_statement(ctx, ast, scope, stat, ret_ty, temps, diagnostics);
    }
}

fn check_statement(
    ctx: &mut CompilationContext,
    ast: &mut Ast,
    scope: TableId,
    stat: NodeId,
    ret_ty: Option<&SymbolType>,
    temps: &mut TempNames,
    diagnostics: &mut Diagnostics,
) {
    match ast.get(stat).kind {
        NodeKind::IfStat => {
            let children = ast.children(stat).to_vec();
            let (cond, then_block, else_block) = (children[0], children[1], children[2]);
            require_boolean(ctx, ast, scope, cond, temps, diagnostics, "if predicate");
            check_stat_block(ctx, ast, scope, then_block, ret_ty, temps, diagnostics);
            check_stat_block(ctx, ast, scope, else_block, ret_ty, temps, diagnostics);
        }
        NodeKind::WhileStat => {
            let children = ast.children(stat).to_vec();
            let (cond, body) = (children[0], children[1]);
            require_boolean(ctx, ast, scope, cond, temps, diagnostics, "while predicate");
            check_stat_block(ctx, ast, scope, body, ret_ty, temps, diagnostics);
        }
        NodeKind::ReadStat => {
            let var = ast.children(stat)[0];
            require_numeric(ctx, ast, scope, var, temps, diagnostics, "read argument");
        }
        NodeKind::WriteStat => {
            let expr = ast.children(stat)[0];
            require_numeric(ctx, ast, scope, expr, temps, diagnostics, "write argument");
        }
        NodeKind::ReturnStat => {
            let expr = ast.children(stat)[0];
            let ty = extract_type(ctx, ast, scope, expr, temps, diagnostics);
            if let (Some(ret_ty), Some(ty)) = (ret_ty, &ty) {
                if ret_ty.base != ty.base || ret_ty.arity() != ty.arity() {
                    diagnostics.error(id_location(ast, expr), "Semantic error: return type does not match the function's declared return type".to_string());
                }
            }
        }
        NodeKind::AssignStat => {
            let children = ast.children(stat).to_vec();
            let (var, expr) = (children[0], children[1]);
            let lhs = extract_type(ctx, ast, scope, var, temps, diagnostics);
            let rhs = extract_type(ctx, ast, scope, expr, temps, diagnostics);
            if let (Some(lhs), Some(rhs)) = (&lhs, &rhs) {
                if lhs.base != rhs.base || lhs.arity() != rhs.arity() {
                    diagnostics.error(id_location(ast, var), "Semantic error: assignment type mismatch".to_string());
                }
            }
        }
        NodeKind::FCallStat => {
            let _ = extract_var_chain(ctx, ast, scope, stat, temps, diagnostics);
        }
        _ => {}
    }
}

fn require_boolean(ctx: &mut CompilationContext, ast: &mut Ast, scope: TableId, node: NodeId, temps: &mut TempNames, diagnostics: &mut Diagnostics, what: &str) {
    let ty = extract_type(ctx, ast, scope, node, temps, diagnostics);
    match ty {
        Some(t) if t.base == BaseType::Boolean && t.arity() == 0 => {}
        _ => diagnostics.error(id_location(ast, node), format!("Semantic error: {what} must be boolean")),
    }
}

fn require_numeric(ctx: &mut CompilationContext, ast: &mut Ast, scope: TableId, node: NodeId, temps: &mut TempNames, diagnostics: &mut Diagnostics, what: &str) {
    let ty = extract_type(ctx, ast, scope, node, temps, diagnostics);
    match ty {
        Some(t) if matches!(t.base, BaseType::Integer | BaseType::Float) && t.arity() == 0 => {}
        _ => diagnostics.error(id_location(ast, node), format!("Semantic error: {what} must be numeric")),
    }
}

/// Resolves `node`'s type, recursing into its subexpressions first
/// (post-order), and inserts a temp record for any computed (non-boolean)
/// value.
fn extract_type(ctx: &mut CompilationContext, ast: &mut Ast, scope: TableId, node: NodeId, temps: &mut TempNames, diagnostics: &mut Diagnostics) -> Option<SymbolType> {
    match ast.get(node).kind {
        NodeKind::Literal => {
            let kind = ast.get(node).token.as_ref().map(|t| t.kind);
            match kind {
                Some(TokenKind::IntegerLiteral) => Some(SymbolType::scalar(BaseType::Integer)),
                Some(TokenKind::FloatLiteral) => Some(SymbolType::scalar(BaseType::Float)),
                _ => None,
            }
        }
        NodeKind::Var => extract_var_chain(ctx, ast, scope, node, temps, diagnostics),
        NodeKind::RelExpr => {
            let children = ast.children(node).to_vec();
            let (left, right) = (children[0], children[1]);
            let lt = extract_type(ctx, ast, scope, left, temps, diagnostics);
            let rt = extract_type(ctx, ast, scope, right, temps, diagnostics);
            match (&lt, &rt) {
                (Some(lt), Some(rt)) if lt.base == rt.base && lt.arity() == 0 && rt.arity() == 0 && matches!(lt.base, BaseType::Integer | BaseType::Float) => {
                    Some(SymbolType::scalar(BaseType::Boolean))
                }
                (Some(_), Some(_)) => {
                    diagnostics.error(id_location(ast, node), "Semantic error: relational operands must be numeric and of equal type".to_string());
                    None
                }
                _ => None,
            }
        }
        NodeKind::AddExpr | NodeKind::MultExpr => {
            let children = ast.children(node).to_vec();
            let (left, right) = (children[0], children[1]);
            let lt = extract_type(ctx, ast, scope, left, temps, diagnostics);
            let rt = extract_type(ctx, ast, scope, right, temps, diagnostics);
            let op = ast.get(node).token.as_ref().map(|t| t.kind);
            let is_logical = matches!(op, Some(TokenKind::And) | Some(TokenKind::Or));
            match (&lt, &rt) {
                (Some(lt), Some(rt)) if lt.base == rt.base && lt.arity() == 0 && rt.arity() == 0 => {
                    if is_logical {
                        if lt.base == BaseType::Boolean {
                            Some(SymbolType::scalar(BaseType::Boolean))
                        } else {
                            diagnostics.error(id_location(ast, node), "Semantic error: logical operator requires boolean operands".to_string());
                            None
                        }
                    } else if matches!(lt.base, BaseType::Integer | BaseType::Float) {
                        let result = lt.clone();
                        insert_temp(ctx, ast, scope, node, result.clone(), temps);
                        Some(result)
                    } else {
                        diagnostics.error(id_location(ast, node), "Semantic error: arithmetic operator requires numeric operands".to_string());
                        None
                    }
                }
                (Some(_), Some(_)) => {
                    diagnostics.error(id_location(ast, node), "Semantic error: operand types do not match".to_string());
                    None
                }
                _ => None,
            }
        }
        NodeKind::Not => {
            let inner = ast.children(node)[0];
            let it = extract_type(ctx, ast, scope, inner, temps, diagnostics);
            match it {
                Some(t) if t.base == BaseType::Boolean && t.arity() == 0 => Some(t),
                Some(_) => {
                    diagnostics.error(id_location(ast, node), "Semantic error: 'not' requires a boolean operand".to_string());
                    None
                }
                None => None,
            }
        }
        NodeKind::Sign => {
            let inner = ast.children(node)[0];
            let it = extract_type(ctx, ast, scope, inner, temps, diagnostics);
            match it {
                Some(t) if matches!(t.base, BaseType::Integer | BaseType::Float) && t.arity() == 0 => {
                    insert_temp(ctx, ast, scope, node, t.clone(), temps);
                    Some(t)
                }
                Some(_) => {
                    diagnostics.error(id_location(ast, node), "Semantic error: sign requires a numeric operand".to_string());
                    None
                }
                None => None,
            }
        }
        _ => None,
    }
}

fn insert_temp(ctx: &mut CompilationContext, ast: &mut Ast, scope: TableId, node: NodeId, ty: SymbolType, temps: &mut TempNames) {
    let name = temps.next(ctx);
    let record = Record::new(name, ty, RecordKind::Temp, id_location(ast, node));
    ctx.table_mut(scope).insert(record.clone());
    ast.get_mut(node).temp_record = Some(record);
}

/// Resolves the chain of `DATA_MEMBER`/`F_CALL` segments in a `var` (or
/// `f_call_stat`) node, left to right: the first segment resolves through
/// the enclosing scope, every later segment through the previous segment's
/// class table.
fn extract_var_chain(ctx: &mut CompilationContext, ast: &mut Ast, scope: TableId, chain_node: NodeId, temps: &mut TempNames, diagnostics: &mut Diagnostics) -> Option<SymbolType> {
    let segments = ast.children(chain_node).to_vec();
    let mut current_ty: Option<SymbolType> = None;
    let mut current_table: Option<TableId> = None;

    for (i, &segment) in segments.iter().enumerate() {
        match ast.get(segment).kind {
            NodeKind::DataMember => {
                let seg_children = ast.children(segment).to_vec();
                let (name_id, index_list) = (seg_children[0], seg_children[1]);
                let name_text = ast.get(name_id).token.as_ref().map(|t| t.lexeme.clone()).unwrap_or_default();
                let location = id_location(ast, name_id);
                let name_sym = ctx.interner.intern(&name_text);

                let candidates = if i == 0 {
                    ctx.table(scope).search_in_scope(ctx, name_sym)
                } else {
                    match current_table {
                        Some(t) => ctx.table(t).search_member(ctx, name_sym, Visibility::Public),
                        None => Vec::new(),
                    }
                };
                let Some(record) = candidates.into_iter().find(|r| r.kind != RecordKind::Function) else {
                    diagnostics.error(location, format!("Semantic error: undeclared identifier '{name_text}'"));
                    return None;
                };
                ast.get_mut(segment).record = Some(record.clone());

                let indices = ast.children(index_list).to_vec();
                for &idx in &indices {
                    match extract_type(ctx, ast, scope, idx, temps, diagnostics) {
                        Some(t) if t.base == BaseType::Integer && t.arity() == 0 => {}
                        _ => diagnostics.error(id_location(ast, idx), "Semantic error: array index must be an integer".to_string()),
                    }
                }
                if indices.len() > record.ty.arity() {
                    diagnostics.error(location, format!("Semantic error: too many indices on '{name_text}'"));
                }
                if !indices.is_empty() {
                    insert_temp(ctx, ast, scope, segment, SymbolType::scalar(BaseType::Integer), temps);
                }

                let remaining = record.ty.dims.get(indices.len()..).map(|d| d.to_vec()).unwrap_or_default();
                current_ty = Some(SymbolType { base: record.ty.base, dims: remaining });
                current_table = current_ty.as_ref().and_then(|t| t.base.class_name()).and_then(|n| ctx.class_table_id(n));
            }
            NodeKind::FCall => {
                let seg_children = ast.children(segment).to_vec();
                let (name_id, arg_list) = (seg_children[0], seg_children[1]);
                let name_text = ast.get(name_id).token.as_ref().map(|t| t.lexeme.clone()).unwrap_or_default();
                let location = id_location(ast, name_id);
                let name_sym = ctx.interner.intern(&name_text);

                let arg_types: Vec<Option<SymbolType>> = ast
                    .children(arg_list)
                    .to_vec()
                    .into_iter()
                    .map(|a| extract_type(ctx, ast, scope, a, temps, diagnostics))
                    .collect();

                let candidates = if i == 0 {
                    ctx.table(scope).search_in_scope(ctx, name_sym)
                } else {
                    match current_table {
                        Some(t) => ctx.table(t).search_member(ctx, name_sym, Visibility::Public),
                        None => Vec::new(),
                    }
                };
                let chosen = candidates.into_iter().filter(|r| r.kind == RecordKind::Function).find(|r| match &r.params {
                    Some(params) => {
                        params.len() == arg_types.len()
                            && params.iter().zip(&arg_types).all(|(p, a)| a.as_ref().is_some_and(|a| a.matches_shape(&p.ty)))
                    }
                    None => arg_types.is_empty(),
                });
                let Some(record) = chosen else {
                    diagnostics.error(location, format!("Semantic error: no matching overload of '{name_text}'"));
                    return None;
                };
                ast.get_mut(segment).record = Some(record.clone());

                if record.ty.base != BaseType::Void {
                    insert_temp(ctx, ast, scope, segment, record.ty.clone(), temps);
                }
                current_ty = Some(record.ty.clone());
                current_table = current_ty.as_ref().and_then(|t| t.base.class_name()).and_then(|n| ctx.class_table_id(n));
            }
            _ => {}
        }
    }
    current_ty
}
