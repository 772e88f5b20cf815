use crate::{BaseType, CompilationContext, Location, Record, RecordKind, SymbolType};

fn loc() -> Location {
    Location::new(1, 1)
}

#[test]
fn scalar_sizes_match_primitive_widths() {
    let ctx = CompilationContext::new();
    assert_eq!(SymbolType::scalar(BaseType::Integer).size(&ctx), 4);
    assert_eq!(SymbolType::scalar(BaseType::Float).size(&ctx), 8);
    assert_eq!(SymbolType::scalar(BaseType::Void).size(&ctx), 0);
    assert_eq!(SymbolType::scalar(BaseType::Boolean).size(&ctx), 0);
}

#[test]
fn array_size_is_product_of_dims_times_base() {
    let ctx = CompilationContext::new();
    let ty = SymbolType {
        base: BaseType::Integer,
        dims: vec![Some(3), Some(4)],
    };
    assert_eq!(ty.size(&ctx), 3 * 4 * 4);
}

#[test]
fn unspecified_param_dims_contribute_no_storage() {
    let ctx = CompilationContext::new();
    let ty = SymbolType {
        base: BaseType::Integer,
        dims: vec![None, None],
    };
    assert_eq!(ty.size(&ctx), 4);
    assert!(ty.is_complex());
}

#[test]
fn mul_for_dim_is_trailing_product() {
    let ctx = CompilationContext::new();
    let ty = SymbolType {
        base: BaseType::Integer,
        dims: vec![Some(2), Some(3), Some(4)],
    };
    assert_eq!(ty.mul_for_dim(0, &ctx), 3 * 4 * 4);
    assert_eq!(ty.mul_for_dim(1, &ctx), 4 * 4);
    assert_eq!(ty.mul_for_dim(2, &ctx), 4);
}

#[test]
fn class_size_tracks_table_as_it_grows() {
    let mut ctx = CompilationContext::new();
    let name = ctx.interner.intern("Point");
    let table_id = ctx.new_class_table(name);
    assert_eq!(BaseType::Class(name).size(&ctx), 0);

    let x = ctx.interner.intern("x");
    ctx.table_mut(table_id)
        .insert(Record::new(x, SymbolType::scalar(BaseType::Integer), RecordKind::Data, loc()));
    assert_eq!(BaseType::Class(name).size(&ctx), 4);

    let y = ctx.interner.intern("y");
    ctx.table_mut(table_id)
        .insert(Record::new(y, SymbolType::scalar(BaseType::Integer), RecordKind::Data, loc()));
    assert_eq!(BaseType::Class(name).size(&ctx), 8);
}

#[test]
fn matches_shape_ignores_dim_sizes() {
    let a = SymbolType {
        base: BaseType::Integer,
        dims: vec![Some(2)],
    };
    let b = SymbolType {
        base: BaseType::Integer,
        dims: vec![Some(99)],
    };
    let c = SymbolType::scalar(BaseType::Integer);
    assert!(a.matches_shape(&b));
    assert!(!a.matches_shape(&c));
}
