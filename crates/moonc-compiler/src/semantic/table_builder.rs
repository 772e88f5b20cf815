//! Visitor 1: bottom-up construction of records and symbol tables from the
//! parsed AST (§4.3 "Table Builder").

use moonc_core::{BaseType, CompilationContext, Record, RecordKind, SymbolType, TableId, Visibility};

use crate::ast::{Ast, NodeId, NodeKind};

use super::resolve::{base_type_of, id_location, id_text, symbol_type_of};

/// Walks `prog`'s three sections — classes, then free/method function
/// definitions, then `main` — populating `ctx` with every table the rest of
/// analysis needs.
pub fn build_tables(ctx: &mut CompilationContext, ast: &mut Ast, prog: NodeId) {
    let [class_list, func_list, main] = prog_children(ast, prog);

    for class_decl in ast.children(class_list).to_vec() {
        build_class(ctx, ast, class_decl);
    }
    for func_def in ast.children(func_list).to_vec() {
        build_func_def(ctx, ast, func_def);
    }
    build_main(ctx, ast, main);
}

fn prog_children(ast: &Ast, prog: NodeId) -> [NodeId; 3] {
    let children = ast.children(prog);
    [children[0], children[1], children[2]]
}

fn build_class(ctx: &mut CompilationContext, ast: &mut Ast, class_decl: NodeId) {
    let children = ast.children(class_decl).to_vec();
    let (name_id, inher_list, member_list) = (children[0], children[1], children[2]);

    let name_text = id_text(ast, name_id).to_string();
    let location = id_location(ast, name_id);
    let name_sym = ctx.interner.intern(&name_text);

    let table_id = ctx.new_class_table(name_sym);

    let inherits: Vec<BaseType> = ast
        .children(inher_list)
        .to_vec()
        .into_iter()
        .map(|id| {
            let text = id_text(ast, id).to_string();
            BaseType::Class(ctx.interner.intern(&text))
        })
        .collect();
    ctx.table_mut(table_id).inherits = inherits;

    // A class record in globals carrying a non-null nested table lets a
    // bare class name resolve to its table like any other symbol (§3, (i)).
    let mut class_record = Record::new(name_sym, SymbolType::scalar(BaseType::Class(name_sym)), RecordKind::Class, location);
    class_record.table = Some(table_id);
    ctx.globals_mut().insert(class_record.clone());
    ast.get_mut(class_decl).record = Some(class_record);

    for member_decl in ast.children(member_list).to_vec() {
        build_member(ctx, ast, member_decl, table_id);
    }
}

fn build_member(ctx: &mut CompilationContext, ast: &mut Ast, member_decl: NodeId, class_table: TableId) {
    let children = ast.children(member_decl).to_vec();
    let (visibility_node, inner) = (children[0], children[1]);
    let visibility = match ast.get(visibility_node).kind {
        NodeKind::Visibility if id_text(ast, visibility_node) == "private" => Visibility::Private,
        NodeKind::Visibility => Visibility::Public,
        _ => Visibility::Public,
    };

    match ast.get(inner).kind {
        NodeKind::FuncDecl => build_func_decl(ctx, ast, inner, class_table, visibility),
        NodeKind::VarDecl => build_data_member(ctx, ast, inner, class_table, visibility),
        _ => {}
    }
}

fn build_func_decl(ctx: &mut CompilationContext, ast: &mut Ast, func_decl: NodeId, class_table: TableId, visibility: Visibility) {
    let children = ast.children(func_decl).to_vec();
    let (name_id, param_list, ret) = (children[0], children[1], children[2]);
    let name_text = id_text(ast, name_id).to_string();
    let location = id_location(ast, name_id);
    let name_sym = ctx.interner.intern(&name_text);

    let params = build_param_sigs(ctx, ast, param_list);
    let ret_ty = match ast.get(ret).kind {
        NodeKind::Type => symbol_type_of_no_dims(ctx, ast, ret),
        _ => SymbolType::scalar(BaseType::Void),
    };

    let mut record = Record::new(name_sym, ret_ty, RecordKind::Function, location);
    record.params = Some(params);
    record.visibility = Some(visibility);
    ctx.table_mut(class_table).insert(record.clone());
    ast.get_mut(func_decl).record = Some(record);
}

fn build_data_member(ctx: &mut CompilationContext, ast: &mut Ast, var_decl: NodeId, class_table: TableId, visibility: Visibility) {
    let children = ast.children(var_decl).to_vec();
    let (type_node, name_id, dim_list) = (children[0], children[1], children[2]);
    let name_text = id_text(ast, name_id).to_string();
    let location = id_location(ast, name_id);
    let name_sym = ctx.interner.intern(&name_text);
    let ty = symbol_type_of(ctx, ast, type_node, dim_list);

    let mut record = Record::new(name_sym, ty, RecordKind::Data, location);
    record.visibility = Some(visibility);
    ctx.table_mut(class_table).insert(record.clone());
    ast.get_mut(var_decl).record = Some(record);
}

/// `var_decl -> local` and `func_param -> param`, used inside function/main
/// bodies; unlike data members these never carry visibility.
fn build_local_or_param(ctx: &mut CompilationContext, ast: &mut Ast, node: NodeId, table: TableId, kind: RecordKind) {
    let children = ast.children(node).to_vec();
    let (type_node, name_id, dim_list) = match kind {
        RecordKind::Param => (children[1], children[0], children[2]),
        _ => (children[0], children[1], children[2]),
    };
    let name_text = id_text(ast, name_id).to_string();
    let location = id_location(ast, name_id);
    let name_sym = ctx.interner.intern(&name_text);
    let ty = symbol_type_of(ctx, ast, type_node, dim_list);

    let record = Record::new(name_sym, ty, kind, location);
    ctx.table_mut(table).insert(record.clone());
    ast.get_mut(node).record = Some(record);
}

fn build_param_sigs(ctx: &mut CompilationContext, ast: &mut Ast, param_list: NodeId) -> Vec<moonc_core::ParamSig> {
    ast.children(param_list)
        .to_vec()
        .into_iter()
        .map(|func_param| {
            let children = ast.children(func_param).to_vec();
            let (name_id, type_node, dim_list) = (children[0], children[1], children[2]);
            let name_sym = ctx.interner.intern(id_text(ast, name_id));
            moonc_core::ParamSig {
                name: name_sym,
                ty: symbol_type_of(ctx, ast, type_node, dim_list),
            }
        })
        .collect()
}

fn symbol_type_of_no_dims(ctx: &mut CompilationContext, ast: &Ast, type_node: NodeId) -> SymbolType {
    SymbolType::scalar(base_type_of(ctx, ast, type_node))
}

fn build_func_def(ctx: &mut CompilationContext, ast: &mut Ast, func_def: NodeId) {
    let children = ast.children(func_def).to_vec();
    let (scope, name_id, param_list, ret, local_list, stat_block) =
        (children[0], children[1], children[2], children[3], children[4], children[5]);

    let name_text = id_text(ast, name_id).to_string();
    let location = id_location(ast, name_id);
    let name_sym = ctx.interner.intern(&name_text);
    let param_sigs = build_param_sigs(ctx, ast, param_list);
    let ret_ty = match ast.get(ret).kind {
        NodeKind::Type => symbol_type_of_no_dims(ctx, ast, ret),
        _ => SymbolType::scalar(BaseType::Void),
    };

    let scoped_class = match ast.get(scope).kind {
        NodeKind::ScopeSpec => Some(id_text(ast, scope).to_string()),
        _ => None,
    };

    let table_name = match &scoped_class {
        Some(class_name) => format!("{class_name}::{name_text}"),
        None => name_text.clone(),
    };
    let func_table = ctx.new_function_table(table_name);

    for func_param in ast.children(param_list).to_vec() {
        build_local_or_param(ctx, ast, func_param, func_table, RecordKind::Param);
    }
    for local in ast.children(local_list).to_vec() {
        build_local_or_param(ctx, ast, local, func_table, RecordKind::Local);
    }

    if let Some(class_name) = &scoped_class {
        let class_sym = ctx.interner.intern(class_name);
        if let Some(class_table) = ctx.class_table_id(class_sym) {
            ctx.table_mut(func_table).inherits = vec![BaseType::Class(class_sym)];
            let matching = ctx
                .table(class_table)
                .get(name_sym)
                .iter()
                .position(|r| r.kind == RecordKind::Function && r.table.is_none() && params_match(&r.params, &param_sigs) && r.ty.matches_shape(&ret_ty));
            if let Some(index) = matching {
                if let Some(entries) = ctx.table_mut(class_table).get_mut(name_sym) {
                    entries[index].table = Some(func_table);
                }
            }
        }
        // Cached on the `func_def` node regardless of whether a matching
        // declaration was found, so Visitor 2 can report "defined without
        // declaration" by checking whether any declaration's `table` ended
        // up pointing back at this same table id.
        let mut record = Record::new(name_sym, ret_ty, RecordKind::Function, location);
        record.params = Some(param_sigs);
        record.table = Some(func_table);
        ast.get_mut(func_def).record = Some(record);
    } else {
        let mut record = Record::new(name_sym, ret_ty, RecordKind::Function, location);
        record.params = Some(param_sigs);
        record.table = Some(func_table);
        ctx.globals_mut().insert(record.clone());
        ast.get_mut(func_def).record = Some(record);
    }

    ast.get_mut(func_def).temp_record = None;
    let _ = stat_block; // type-checking/codegen walk this independently via the func table
}

fn params_match(declared: &Option<Vec<moonc_core::ParamSig>>, actual: &[moonc_core::ParamSig]) -> bool {
    match declared {
        Some(params) => params.len() == actual.len() && params.iter().zip(actual).all(|(a, b)| a.ty.matches_shape(&b.ty)),
        None => actual.is_empty(),
    }
}

fn build_main(ctx: &mut CompilationContext, ast: &mut Ast, main: NodeId) {
    let children = ast.children(main).to_vec();
    let (local_list, _stat_block) = (children[0], children[1]);
    let main_sym = ctx.interner.intern("main");
    let main_table = ctx.new_function_table("main");

    for local in ast.children(local_list).to_vec() {
        build_local_or_param(ctx, ast, local, main_table, RecordKind::Local);
    }

    let mut record = Record::new(main_sym, SymbolType::scalar(BaseType::Void), RecordKind::Function, moonc_core::Location::new(1, 1));
    record.table = Some(main_table);
    ast.get_mut(main).record = Some(record);
}
