//! Offset Planner: the single end-of-pipeline pass that assigns ascending
//! byte offsets to every record in every table (§4.3 "Offset Planner").
//!
//! Runs after all three visitors, over the whole table arena at once —
//! every table (globals, every class, every free function, every method,
//! `main`) gets its own independent ascending offset sequence, so there is
//! no need to recurse by table nesting: walking the flat arena already
//! reaches everything.

use moonc_core::{CompilationContext, RecordKind, TableId};

pub fn assign_offsets(ctx: &mut CompilationContext) {
    for table_id in ctx.table_ids().collect::<Vec<_>>() {
        let baseline = baseline_for(ctx, table_id);
        assign_table_offsets(ctx, table_id, baseline);
    }
}

/// Exposed to the code generator, which needs the same baseline to compute
/// a function's total frame size for its entry-widening instruction.
pub(crate) fn baseline_for(ctx: &CompilationContext, table_id: TableId) -> u32 {
    let table = ctx.table(table_id);
    if table.is_globals {
        0
    } else if table.is_function {
        if table.name == "main" {
            0
        } else if !table.inherits.is_empty() {
            // return slot + saved return address + `this` pointer
            12
        } else {
            // return slot + saved return address
            8
        }
    } else {
        table
            .inherits
            .iter()
            .filter_map(|bt| ctx.class_table_of(*bt))
            .map(|t| t.current_size(ctx))
            .sum()
    }
}

fn assign_table_offsets(ctx: &mut CompilationContext, table_id: TableId, baseline: u32) {
    let sizes: Vec<(RecordKind, u32)> = ctx.table(table_id).entries_in_order().map(|r| (r.kind, r.storage_size(ctx))).collect();

    let mut offset = baseline;
    let mut assigned = Vec::with_capacity(sizes.len());
    for (kind, size) in &sizes {
        match kind {
            RecordKind::Class | RecordKind::Function => assigned.push(0),
            _ => {
                assigned.push(offset);
                offset += size;
            }
        }
    }

    for (record, off) in ctx.table_mut(table_id).entries_in_order_mut().zip(assigned) {
        record.offset = Some(off as i32);
    }
}
