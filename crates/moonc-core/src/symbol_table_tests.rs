use crate::record::RecordKind;
use crate::{BaseType, CompilationContext, Location, Record, SymbolType, Visibility};

fn loc() -> Location {
    Location::new(1, 1)
}

#[test]
fn search_member_finds_local_entry() {
    let mut ctx = CompilationContext::new();
    let class = ctx.interner.intern("Shape");
    let table_id = ctx.new_class_table(class);
    let area = ctx.interner.intern("area");
    let mut rec = Record::new(area, SymbolType::scalar(BaseType::Integer), RecordKind::Function, loc());
    rec.visibility = Some(Visibility::Public);
    ctx.table_mut(table_id).insert(rec);

    let found = ctx.table(table_id).search_member(&ctx, area, Visibility::Private);
    assert_eq!(found.len(), 1);
}

#[test]
fn search_member_hides_private_entries_from_public_lookup() {
    let mut ctx = CompilationContext::new();
    let class = ctx.interner.intern("Shape");
    let table_id = ctx.new_class_table(class);
    let helper = ctx.interner.intern("helper");
    let mut rec = Record::new(helper, SymbolType::scalar(BaseType::Integer), RecordKind::Function, loc());
    rec.visibility = Some(Visibility::Private);
    ctx.table_mut(table_id).insert(rec);

    let as_owner = ctx.table(table_id).search_member(&ctx, helper, Visibility::Private);
    assert_eq!(as_owner.len(), 1);

    let as_stranger = ctx.table(table_id).search_member(&ctx, helper, Visibility::Public);
    assert!(as_stranger.is_empty());
}

#[test]
fn search_member_walks_inheritance_chain() {
    let mut ctx = CompilationContext::new();
    let base = ctx.interner.intern("Base");
    let base_id = ctx.new_class_table(base);
    let greet = ctx.interner.intern("greet");
    let mut rec = Record::new(greet, SymbolType::scalar(BaseType::Integer), RecordKind::Function, loc());
    rec.visibility = Some(Visibility::Public);
    ctx.table_mut(base_id).insert(rec);

    let derived = ctx.interner.intern("Derived");
    let derived_id = ctx.new_class_table(derived);
    ctx.table_mut(derived_id).inherits.push(BaseType::Class(base));

    let found = ctx.table(derived_id).search_member(&ctx, greet, Visibility::Private);
    assert_eq!(found.len(), 1);
}

#[test]
fn search_in_scope_falls_back_to_globals() {
    let mut ctx = CompilationContext::new();
    let write = ctx.interner.intern("write");
    ctx.globals_mut().insert(Record::new(
        write,
        SymbolType::scalar(BaseType::Void),
        RecordKind::Function,
        loc(),
    ));

    let class = ctx.interner.intern("Main");
    let table_id = ctx.new_class_table(class);
    let found = ctx.table(table_id).search_in_scope(&ctx, write);
    assert_eq!(found.len(), 1);
}

#[test]
fn globals_search_in_scope_never_recurses_into_itself() {
    let mut ctx = CompilationContext::new();
    let name = ctx.interner.intern("x");
    ctx.globals_mut().insert(Record::new(
        name,
        SymbolType::scalar(BaseType::Integer),
        RecordKind::Data,
        loc(),
    ));
    let found = ctx.globals().search_in_scope(&ctx, name);
    assert_eq!(found.len(), 1);
}

#[test]
fn entries_in_order_preserves_insertion_order() {
    let mut ctx = CompilationContext::new();
    let class = ctx.interner.intern("Pair");
    let table_id = ctx.new_class_table(class);
    let a = ctx.interner.intern("a");
    let b = ctx.interner.intern("b");
    ctx.table_mut(table_id)
        .insert(Record::new(b, SymbolType::scalar(BaseType::Integer), RecordKind::Data, loc()));
    ctx.table_mut(table_id)
        .insert(Record::new(a, SymbolType::scalar(BaseType::Integer), RecordKind::Data, loc()));

    let names: Vec<_> = ctx.table(table_id).entries_in_order().map(|r| r.name).collect();
    assert_eq!(names, vec![b, a]);
}
