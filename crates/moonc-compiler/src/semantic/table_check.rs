//! Visitor 2: structural checks over the tables Visitor 1 built (§4.3
//! "Table Check") — parent existence, dependency cycles, duplicate/overload/
//! shadow detection, return reachability, declaration/definition matching,
//! and class-name validation on every `type` leaf.

use std::collections::{HashMap, HashSet, VecDeque};

use moonc_core::{CompilationContext, ParamSig, RecordKind, Symbol, TableId, Visibility};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::diagnostics::{Diagnostic, Diagnostics};

use super::resolve::id_location;

pub fn check_tables(ctx: &mut CompilationContext, ast: &Ast, prog: NodeId, diagnostics: &mut Diagnostics) {
    check_parents_and_self_inheritance(ctx, diagnostics);
    check_dependency_cycles(ctx, diagnostics);

    let class_tables: Vec<TableId> = ctx.class_names().filter_map(|name| ctx.class_table_id(name)).collect();
    for &table_id in &class_tables {
        check_class_duplicates(ctx, table_id, diagnostics);
        check_shadowing(ctx, table_id, diagnostics);
        check_declarations_have_definitions(ctx, table_id, diagnostics);
    }

    let func_tables = collect_function_tables(ast, prog);
    for &table_id in &func_tables {
        check_local_duplicates(ctx, table_id, diagnostics);
    }

    check_definitions_have_declarations(ast, prog, ctx, diagnostics);
    check_return_reachability(ast, prog, diagnostics);
    check_type_leaves(ctx, ast, prog, diagnostics);
}

fn class_location(ctx: &CompilationContext, name: Symbol) -> moonc_core::Location {
    ctx.globals()
        .get(name)
        .iter()
        .find(|r| r.kind == RecordKind::Class)
        .map(|r| r.location)
        .unwrap_or(moonc_core::Location::new(1, 1))
}

fn check_parents_and_self_inheritance(ctx: &mut CompilationContext, diagnostics: &mut Diagnostics) {
    for name in ctx.class_names().collect::<Vec<_>>() {
        let table_id = ctx.class_table_id(name).unwrap();
        let location = class_location(ctx, name);
        let inherits = ctx.table(table_id).inherits.clone();
        let mut kept = Vec::new();
        for parent in inherits {
            let Some(parent_name) = parent.class_name() else { continue };
            if parent_name == name {
                diagnostics.error(
                    location,
                    format!("Semantic error: class '{}' inherits from itself", ctx.interner.resolve(name)),
                );
                continue;
            }
            if ctx.class_table_id(parent_name).is_none() {
                diagnostics.error(
                    location,
                    format!(
                        "Semantic error: class '{}' inherits undeclared class '{}'",
                        ctx.interner.resolve(name),
                        ctx.interner.resolve(parent_name)
                    ),
                );
                continue;
            }
            kept.push(parent);
        }
        ctx.table_mut(table_id).inherits = kept;
    }
}

/// Edges = inheritance edges ∪ "has a data member of class type" edges.
/// Both are forbidden to cycle, for the same reason: a class whose size
/// depends on itself has no finite size.
fn check_dependency_cycles(ctx: &CompilationContext, diagnostics: &mut Diagnostics) {
    let mut edges: HashMap<Symbol, Vec<Symbol>> = HashMap::new();
    for name in ctx.class_names() {
        let table_id = ctx.class_table_id(name).unwrap();
        let table = ctx.table(table_id);
        let mut targets: Vec<Symbol> = table.inherits.iter().filter_map(|bt| bt.class_name()).collect();
        for record in table.entries_in_order() {
            if record.kind == RecordKind::Data {
                if let Some(class_name) = record.ty.base.class_name() {
                    targets.push(class_name);
                }
            }
        }
        edges.entry(name).or_default().extend(targets);
    }

    let mut reported: HashSet<Vec<Symbol>> = HashSet::new();
    while let Some(cycle) = find_cycle(&edges) {
        let canonical = canonical_cycle(&cycle);
        if reported.insert(canonical) {
            let rendered: Vec<&str> = cycle.iter().map(|&s| ctx.interner.resolve(s)).collect();
            diagnostics.error(
                class_location(ctx, cycle[0]),
                format!("Semantic error: inheritance/dependency cycle {{{}}}", rendered.join("->")),
            );
        }
        let from = cycle[cycle.len() - 2];
        let to = cycle[cycle.len() - 1];
        if let Some(v) = edges.get_mut(&from) {
            if let Some(pos) = v.iter().position(|&s| s == to) {
                v.remove(pos);
            }
        }
    }
}

fn find_cycle(edges: &HashMap<Symbol, Vec<Symbol>>) -> Option<Vec<Symbol>> {
    let mut starts: Vec<Symbol> = edges.keys().copied().collect();
    starts.sort_by_key(Symbol::as_u32);
    for start in starts {
        let mut queue: VecDeque<Vec<Symbol>> = VecDeque::new();
        queue.push_back(vec![start]);
        let mut visited: HashSet<Symbol> = HashSet::new();
        visited.insert(start);
        while let Some(path) = queue.pop_front() {
            let node = *path.last().unwrap();
            for &next in edges.get(&node).into_iter().flatten() {
                if next == start {
                    let mut cycle = path.clone();
                    cycle.push(next);
                    return Some(cycle);
                }
                if visited.insert(next) {
                    let mut new_path = path.clone();
                    new_path.push(next);
                    queue.push_back(new_path);
                }
            }
        }
    }
    None
}

/// Sorted canonical form (by `Symbol` order) used to dedupe cycles that are
/// the same set of classes reached from a different starting point.
fn canonical_cycle(cycle: &[Symbol]) -> Vec<Symbol> {
    let mut members: Vec<Symbol> = cycle[..cycle.len() - 1].to_vec();
    members.sort_by_key(Symbol::as_u32);
    members
}

fn params_shape_eq(a: &Option<Vec<ParamSig>>, b: &Option<Vec<ParamSig>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ty.matches_shape(&y.ty)),
        (None, None) => true,
        _ => false,
    }
}

fn check_class_duplicates(ctx: &CompilationContext, table_id: TableId, diagnostics: &mut Diagnostics) {
    let table = ctx.table(table_id);
    for name in table.names().collect::<Vec<_>>() {
        let entries = table.get(name);
        if entries.len() < 2 {
            continue;
        }
        if entries.iter().all(|r| r.kind == RecordKind::Function) {
            for i in 0..entries.len() {
                for j in (i + 1)..entries.len() {
                    if params_shape_eq(&entries[i].params, &entries[j].params) {
                        diagnostics.push(
                            Diagnostic::error(
                                entries[j].location,
                                format!("Semantic error: function '{}' multiply declared with identical parameters", ctx.interner.resolve(name)),
                            )
                            .related_to(entries[i].location, "first declared here"),
                        );
                    } else {
                        diagnostics.warning(
                            entries[j].location,
                            format!("Semantic warning: function '{}' is overloaded", ctx.interner.resolve(name)),
                        );
                    }
                }
            }
        } else {
            for pair in entries.windows(2) {
                diagnostics.push(
                    Diagnostic::error(pair[1].location, format!("Semantic error: duplicate member '{}'", ctx.interner.resolve(name)))
                        .related_to(pair[0].location, "first declared here"),
                );
            }
        }
    }
}

fn check_local_duplicates(ctx: &CompilationContext, table_id: TableId, diagnostics: &mut Diagnostics) {
    let table = ctx.table(table_id);
    for name in table.names().collect::<Vec<_>>() {
        let entries = table.get(name);
        for pair in entries.windows(2) {
            diagnostics.push(
                Diagnostic::error(
                    pair[1].location,
                    format!("Semantic error: duplicate {} '{}'", pair[1].kind, ctx.interner.resolve(name)),
                )
                .related_to(pair[0].location, "first declared here"),
            );
        }
    }
}

fn check_shadowing(ctx: &CompilationContext, table_id: TableId, diagnostics: &mut Diagnostics) {
    let table = ctx.table(table_id);
    let inherits = table.inherits.clone();
    for name in table.names().collect::<Vec<_>>() {
        let own = table.get(name).to_vec();
        for parent in &inherits {
            let Some(parent_table) = ctx.class_table_of(*parent) else { continue };
            for inherited in parent_table.search_member(ctx, name, Visibility::Public) {
                for rec in &own {
                    if rec.kind == RecordKind::Data && inherited.kind == RecordKind::Data {
                        diagnostics.warning(
                            rec.location,
                            format!("Semantic warning: data member '{}' shadows an inherited member", ctx.interner.resolve(name)),
                        );
                    } else if rec.kind == RecordKind::Function
                        && inherited.kind == RecordKind::Function
                        && params_shape_eq(&rec.params, &inherited.params)
                    {
                        diagnostics.warning(
                            rec.location,
                            format!("Semantic warning: function '{}' shadows an inherited function with identical parameters", ctx.interner.resolve(name)),
                        );
                    }
                }
            }
        }
    }
}

fn check_declarations_have_definitions(ctx: &CompilationContext, table_id: TableId, diagnostics: &mut Diagnostics) {
    let table = ctx.table(table_id);
    for record in table.entries_in_order() {
        if record.kind == RecordKind::Function && record.table.is_none() {
            diagnostics.error(
                record.location,
                format!("Semantic error: member function '{}' declared without a definition", ctx.interner.resolve(record.name)),
            );
        }
    }
}

fn collect_function_tables(ast: &Ast, prog: NodeId) -> Vec<TableId> {
    let children = ast.children(prog);
    let (func_list, main) = (children[1], children[2]);
    let mut tables = Vec::new();
    for func_def in ast.children(func_list) {
        if let Some(record) = &ast.get(*func_def).record {
            if let Some(table_id) = record.table {
                tables.push(table_id);
            }
        }
    }
    if let Some(record) = &ast.get(main).record {
        if let Some(table_id) = record.table {
            tables.push(table_id);
        }
    }
    tables
}

fn check_definitions_have_declarations(ast: &Ast, prog: NodeId, ctx: &CompilationContext, diagnostics: &mut Diagnostics) {
    let children = ast.children(prog);
    let func_list = children[1];
    for func_def in ast.children(func_list).to_vec() {
        let scope = ast.children(func_def)[0];
        if ast.get(scope).kind != NodeKind::ScopeSpec {
            continue;
        }
        let Some(record) = &ast.get(func_def).record else { continue };
        let Some(func_table) = record.table else { continue };
        let class_name_text = ast.get(scope).token.as_ref().map(|t| t.lexeme.as_str()).unwrap_or("");
        let Some(class_sym) = ctx.class_names().find(|&s| ctx.interner.resolve(s) == class_name_text) else {
            diagnostics.error(
                id_location(ast, ast.children(func_def)[1]),
                format!("Semantic error: method defined on undeclared class '{class_name_text}'"),
            );
            continue;
        };
        let class_table = ctx.class_table_id(class_sym).unwrap();
        let has_declaration = ctx
            .table(class_table)
            .get(record.name)
            .iter()
            .any(|r| r.kind == RecordKind::Function && r.table == Some(func_table));
        if !has_declaration {
            diagnostics.error(
                record.location,
                format!(
                    "Semantic error: function '{}::{}' defined without a matching declaration",
                    class_name_text,
                    ctx.interner.resolve(record.name)
                ),
            );
        }
    }
}

/// Every path through a non-void function's statement block must reach a
/// `return`; anything following a `return` is unreachable.
fn check_return_reachability(ast: &Ast, prog: NodeId, diagnostics: &mut Diagnostics) {
    let children = ast.children(prog);
    let func_list = children[1];
    for func_def in ast.children(func_list).to_vec() {
        let fd_children = ast.children(func_def);
        let (ret, stat_block) = (fd_children[3], fd_children[5]);
        let is_void = ast.get(ret).kind != NodeKind::Type;
        let returns = block_always_returns(ast, stat_block, diagnostics);
        if !is_void && !returns {
            diagnostics.error(
                id_location(ast, fd_children[1]),
                format!("Semantic error: function '{}' does not return on every path", ast_id_text(ast, fd_children[1])),
            );
        }
    }
}

fn ast_id_text<'a>(ast: &'a Ast, id: NodeId) -> &'a str {
    ast.get(id).token.as_ref().map(|t| t.lexeme.as_str()).unwrap_or("")
}

/// Returns whether `stat_block` always reaches a `return`, warning on any
/// statement that follows one unconditionally.
fn block_always_returns(ast: &Ast, stat_block: NodeId, diagnostics: &mut Diagnostics) -> bool {
    let stats = ast.children(stat_block);
    let mut seen_return = false;
    let mut result = false;
    for &stat in stats {
        if seen_return {
            diagnostics.warning(id_location(ast, stat), "Semantic warning: unreachable statement after return".to_string());
            continue;
        }
        match ast.get(stat).kind {
            NodeKind::ReturnStat => {
                seen_return = true;
                result = true;
            }
            NodeKind::IfStat => {
                let branches = ast.children(stat);
                let (then_block, else_block) = (branches[1], branches[2]);
                let then_returns = block_always_returns(ast, then_block, diagnostics);
                let else_returns = block_always_returns(ast, else_block, diagnostics);
                if then_returns && else_returns {
                    seen_return = true;
                    result = true;
                }
            }
            _ => {}
        }
    }
    result
}

/// Every `type` leaf naming a class must resolve to a class that exists.
fn check_type_leaves(ctx: &CompilationContext, ast: &Ast, prog: NodeId, diagnostics: &mut Diagnostics) {
    for id in 0..ast.len() {
        if ast.get(id).kind != NodeKind::Type {
            continue;
        }
        let Some(token) = &ast.get(id).token else { continue };
        if matches!(token.lexeme.as_str(), "integer" | "float") {
            continue;
        }
        let exists = ctx.class_names().any(|s| ctx.interner.resolve(s) == token.lexeme);
        if !exists {
            diagnostics.error(token.location, format!("Semantic error: undeclared class '{}'", token.lexeme));
        }
    }
    let _ = prog;
}
