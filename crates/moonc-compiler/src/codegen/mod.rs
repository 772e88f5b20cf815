//! Code Generator (§4.4): walks the analyzed AST one more time, turning
//! every statement and expression node's attached `record`/`temp_record`
//! into Moon assembly, accumulated onto each node's own `code: Vec<Line>`.
//!
//! A function's frame is laid out as: offset 0 holds its return value,
//! offset 4 its caller's return address, offset 8 the incoming `this`
//! pointer (methods only), and every param/local/temp after that in
//! declaration order (`semantic::offsets`). A call widens the caller's own
//! frame by [`frame_size`] before writing outgoing arguments, so the
//! callee's baseline offsets land exactly where the caller just wrote them.

mod error;
mod mangle;
mod place;
mod registers;

pub use error::CodegenError;
use mangle::Mangler;
use place::Place;
use registers::{Reg, RegisterPool};

use moonc_core::{BaseType, CompilationContext, Record, RecordKind, SymbolType, TableId};

use crate::ast::{Ast, Line, NodeId, NodeKind};
use crate::semantic::offsets::baseline_for;
use crate::token::TokenKind;

/// One generated assembly function body: its label and ordered lines,
/// ready to be wrapped in the `% begin/end function ... definition`
/// comment pair a reader of the `.moon` file uses to find it.
pub struct Function {
    pub name: String,
    pub lines: Vec<Line>,
}

/// The whole generated program: every function, then every reserved or
/// constant data slot a `read`/`write` statement needed along the way.
pub struct Program {
    pub functions: Vec<Function>,
    data: Vec<Line>,
}

impl Program {
    fn new() -> Self {
        Self {
            functions: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Reserves `size` bytes under `tag`, idempotent by tag so a buffer
    /// shared across many `read`/`write` call sites (`buf`) is only ever
    /// declared once.
    fn reserve(&mut self, tag: &str, size: u32, comment: &str) {
        if self.data.iter().any(|l| l.label.as_deref() == Some(tag)) {
            return;
        }
        self.data.push(Line::labeled(tag, "res", vec![size.to_string()]).commented(comment));
    }

    /// A named constant initialized with `bytes` (`db`). Not present in the
    /// reference implementation's own data model — it calls a
    /// `store_constant` method its `Prog` class never defines, a gap in the
    /// original this crate completes (see DESIGN.md).
    fn constant(&mut self, tag: &str, bytes: &[i32], comment: &str) {
        if self.data.iter().any(|l| l.label.as_deref() == Some(tag)) {
            return;
        }
        let args = bytes.iter().map(|b| b.to_string()).collect();
        self.data.push(Line::labeled(tag, "db", args).commented(comment));
    }

    /// Renders the whole program as Moon assembly text: every function
    /// body, then the data section, symbol column fit to the widest label
    /// actually used anywhere in the program.
    pub fn format(&self) -> String {
        let width = self
            .functions
            .iter()
            .flat_map(|f| f.lines.iter())
            .chain(self.data.iter())
            .map(|l| l.label.as_deref().unwrap_or("").len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for func in &self.functions {
            out.push_str(&format!("% begin function {} definition\n", func.name));
            for line in &func.lines {
                out.push_str(&format_line(line, width));
                out.push('\n');
            }
            out.push_str(&format!("% end function {} definition\n", func.name));
        }
        for line in &self.data {
            out.push_str(&format_line(line, width));
            out.push('\n');
        }
        out
    }
}

fn format_line(line: &Line, symbol_width: usize) -> String {
    let symbol = line.label.as_deref().unwrap_or("");
    let mut out = format!("{symbol:symbol_width$} {:<5} {}", line.op, line.operands.join(","));
    if let Some(comment) = &line.comment {
        out = format!("{out} % {comment}");
    }
    out.trim_end().to_string()
}

/// Total bytes this function's frame occupies: its baseline (return slot,
/// return address, and `this` pointer where applicable) plus every
/// param/local/temp assigned during offset planning. Distinct from
/// [`moonc_core::SymbolTable::current_size`], which only totals `data`
/// members for class sizing — a function's frame includes params, locals
/// and temps instead.
fn frame_size(ctx: &CompilationContext, table: TableId) -> u32 {
    let baseline = baseline_for(ctx, table);
    let own: u32 = ctx.table(table).entries_in_order().map(|r| r.storage_size(ctx)).sum();
    baseline + own
}

fn op_instruction(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Eq => "ceq",
        TokenKind::NeqLex => "cne",
        TokenKind::Lt => "clt",
        TokenKind::Gt => "cgt",
        TokenKind::Lte => "cle",
        TokenKind::Gte => "cge",
        TokenKind::Plus | TokenKind::Or => "add",
        TokenKind::Minus => "sub",
        TokenKind::Div => "div",
        TokenKind::Mult | TokenKind::And => "mul",
        TokenKind::Not => "not",
        _ => "nop",
    }
}

/// Generates Moon assembly for a fully analyzed program.
pub fn generate(ctx: &CompilationContext, ast: &mut Ast, prog: NodeId) -> Result<Program, CodegenError> {
    let mut mangler = Mangler::new();
    let mut program = Program::new();

    let children = ast.children(prog).to_vec();
    let (func_list, main) = (children[1], children[2]);

    for func_def in ast.children(func_list).to_vec() {
        generate_func_def(ctx, ast, &mut mangler, &mut program, func_def)?;
    }
    generate_main(ctx, ast, &mut mangler, &mut program, main)?;
    Ok(program)
}

fn generate_func_def(
    ctx: &CompilationContext,
    ast: &mut Ast,
    mangler: &mut Mangler,
    program: &mut Program,
    func_def: NodeId,
) -> Result<(), CodegenError> {
    let record = ast
        .get(func_def)
        .record
        .clone()
        .ok_or_else(|| CodegenError::Internal("func_def has no record".into()))?;
    let table = record
        .table
        .ok_or_else(|| CodegenError::Internal("func_def record has no table".into()))?;
    let table_name = ctx.table(table).name.clone();

    let stat_block = ast.children(func_def)[5];
    {
        let mut fb = FuncBuilder::new(ctx, table, mangler, program);
        fb.gen_stat_block(ast, stat_block)?;
    }

    let label = mangler.func_label(&table_name);
    let mut lines = vec![Line::labeled(label.clone(), "sw", vec!["-4(r14)".to_string(), "r15".to_string()])];
    for stat in ast.children(stat_block).to_vec() {
        lines.extend(ast.get(stat).code.iter().cloned());
    }
    lines.push(Line::new("sw", vec!["0(r14)".to_string(), "r0".to_string()]).commented("default return value"));
    lines.push(Line::labeled(format!("{label}return"), "lw", vec!["r15".to_string(), "-4(r14)".to_string()]));
    lines.push(Line::new("jr", vec!["r15".to_string()]));

    program.functions.push(Function { name: label, lines });
    Ok(())
}

fn generate_main(
    ctx: &CompilationContext,
    ast: &mut Ast,
    mangler: &mut Mangler,
    program: &mut Program,
    main: NodeId,
) -> Result<(), CodegenError> {
    let record = ast
        .get(main)
        .record
        .clone()
        .ok_or_else(|| CodegenError::Internal("main has no record".into()))?;
    let table = record.table.ok_or_else(|| CodegenError::Internal("main record has no table".into()))?;

    let stat_block = ast.children(main)[1];
    {
        let mut fb = FuncBuilder::new(ctx, table, mangler, program);
        fb.gen_stat_block(ast, stat_block)?;
    }

    let mut lines = vec![Line::labeled("main", "addi", vec!["r14".to_string(), "r0".to_string(), "topaddr".to_string()])];
    for stat in ast.children(stat_block).to_vec() {
        lines.extend(ast.get(stat).code.iter().cloned());
    }
    lines.push(Line::new("hlt", vec![]));

    program.functions.push(Function { name: "main".to_string(), lines });
    Ok(())
}

/// The per-function code generator. Holds the function's own register pool
/// (fresh per function: a register never lives across a call boundary
/// anyway, since every value that outlives its producing instruction is
/// already spilled to a frame slot) plus a shared [`Mangler`] and the
/// [`Program`] being assembled, so statements that need a fresh label or a
/// reserved data slot (`if`/`while`, `read`/`write`) can reach them.
pub(crate) struct FuncBuilder<'a> {
    ctx: &'a CompilationContext,
    table: TableId,
    mangler: &'a mut Mangler,
    program: &'a mut Program,
    pool: RegisterPool,
}

impl<'a> FuncBuilder<'a> {
    fn new(ctx: &'a CompilationContext, table: TableId, mangler: &'a mut Mangler, program: &'a mut Program) -> Self {
        Self {
            ctx,
            table,
            mangler,
            program,
            pool: RegisterPool::new(),
        }
    }

    fn scope_name(&self) -> String {
        self.ctx.table(self.table).name.clone()
    }

    fn gen_stat_block(&mut self, ast: &mut Ast, stat_block: NodeId) -> Result<(), CodegenError> {
        for stat in ast.children(stat_block).to_vec() {
            self.gen_statement(ast, stat)?;
        }
        Ok(())
    }

    fn gen_statement(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        match ast.get(stat).kind {
            NodeKind::IfStat => self.gen_if_stat(ast, stat),
            NodeKind::WhileStat => self.gen_while_stat(ast, stat),
            NodeKind::AssignStat => self.gen_assign_stat(ast, stat),
            NodeKind::ReadStat => self.gen_read_stat(ast, stat),
            NodeKind::WriteStat => self.gen_write_stat(ast, stat),
            NodeKind::ReturnStat => self.gen_return_stat(ast, stat),
            NodeKind::FCallStat => {
                let mut code = Vec::new();
                let _ = self.gen_var_chain(ast, stat, &mut code)?;
                ast.get_mut(stat).code = code;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn gen_expr(&mut self, ast: &mut Ast, node: NodeId) -> Result<(), CodegenError> {
        match ast.get(node).kind {
            NodeKind::Literal => Ok(()),
            NodeKind::Var => {
                let mut code = Vec::new();
                let _ = self.gen_var_chain(ast, node, &mut code)?;
                ast.get_mut(node).code = code;
                Ok(())
            }
            NodeKind::RelExpr => self.gen_rel_expr(ast, node),
            NodeKind::AddExpr | NodeKind::MultExpr => self.gen_dyadic_expr(ast, node),
            NodeKind::Not => self.gen_unary(ast, node),
            NodeKind::Sign => self.gen_unary(ast, node),
            _ => Ok(()),
        }
    }

    fn gen_if_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let children = ast.children(stat).to_vec();
        let (cond, then_block, else_block) = (children[0], children[1], children[2]);
        self.gen_expr(ast, cond)?;

        let scope = self.scope_name();
        let sym = self.mangler.if_label(&scope);
        let reg = self.last_result_register(ast, cond)?;

        self.gen_stat_block(ast, then_block)?;
        self.gen_stat_block(ast, else_block)?;

        let mut code = ast.get(cond).code.clone();
        code.push(Line::new("bz", vec![reg.to_string(), format!("{sym}else")]));
        for stat in ast.children(then_block).to_vec() {
            code.extend(ast.get(stat).code.iter().cloned());
        }
        code.push(Line::new("j", vec![format!("{sym}done")]));
        code.push(Line::labeled(format!("{sym}else"), "nop", vec![]));
        for stat in ast.children(else_block).to_vec() {
            code.extend(ast.get(stat).code.iter().cloned());
        }
        code.push(Line::labeled(format!("{sym}done"), "nop", vec![]));
        ast.get_mut(stat).code = code;
        Ok(())
    }

    fn gen_while_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let children = ast.children(stat).to_vec();
        let (cond, body) = (children[0], children[1]);
        self.gen_expr(ast, cond)?;

        let scope = self.scope_name();
        let sym = self.mangler.while_label(&scope);
        let reg = self.last_result_register(ast, cond)?;

        self.gen_stat_block(ast, body)?;

        let mut cond_code = ast.get(cond).code.clone();
        if let Some(first) = cond_code.first_mut() {
            first.label = Some(sym.clone());
        } else {
            cond_code.push(Line::labeled(sym.clone(), "nop", vec![]));
        }

        let mut code = cond_code;
        code.push(Line::new("bz", vec![reg.to_string(), format!("{sym}done")]));
        for stat in ast.children(body).to_vec() {
            code.extend(ast.get(stat).code.iter().cloned());
        }
        code.push(Line::new("j", vec![sym.clone()]));
        code.push(Line::labeled(format!("{sym}done"), "nop", vec![]));
        ast.get_mut(stat).code = code;
        Ok(())
    }

    /// The register a predicate expression's own last emitted instruction
    /// left its result in (relational ops write their result as the first
    /// operand of their own comparison line).
    fn last_result_register(&self, ast: &Ast, cond: NodeId) -> Result<String, CodegenError> {
        ast.get(cond)
            .code
            .last()
            .and_then(|l| l.operands.first())
            .cloned()
            .ok_or_else(|| CodegenError::Internal("predicate produced no result register".into()))
    }

    fn gen_assign_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let children = ast.children(stat).to_vec();
        let (var, expr) = (children[0], children[1]);
        self.gen_expr(ast, expr)?;
        self.gen_expr(ast, var)?;

        let mut code = ast.get(expr).code.clone();
        code.extend(ast.get(var).code.iter().cloned());

        let rhs_place = node_place(ast, expr);
        let lhs_place = node_place(ast, var);
        let reg = self.pool.acquire()?;
        self.load_place(&mut code, &rhs_place, reg.name())?;
        self.store_place(&mut code, &lhs_place, reg.name())?;
        self.pool.release(reg);
        rhs_place.release(&mut self.pool);
        lhs_place.release(&mut self.pool);

        ast.get_mut(stat).code = code;
        Ok(())
    }

    fn gen_read_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let var = ast.children(stat)[0];
        self.gen_expr(ast, var)?;
        self.program.reserve("buf", 20, "getstr/strint scratch buffer");

        let mut code = ast.get(var).code.clone();
        let own_size = frame_size(self.ctx, self.table);

        let mut call = Vec::new();
        call.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), own_size.to_string()]));
        call.push(Line::new("addi", vec!["r1".to_string(), "r0".to_string(), "buf".to_string()]));
        call.push(Line::new("sw", vec![format!("-{}(r14)", own_size + 4), "r1".to_string()]));
        call.push(Line::new("jl", vec!["r15".to_string(), "getstr".to_string()]));
        call.push(Line::new("addi", vec!["r1".to_string(), "r0".to_string(), "buf".to_string()]));
        call.push(Line::new("sw", vec![format!("-{}(r14)", own_size + 4), "r1".to_string()]));
        call.push(Line::new("jl", vec!["r15".to_string(), "strint".to_string()]));
        let result = self.pool.acquire()?;
        call.push(Line::new("lw", vec![result.name().to_string(), format!("-{own_size}(r14)")]));
        call.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), format!("-{own_size}")]));

        let place = node_place(ast, var);
        self.store_place(&mut call, &place, result.name())?;
        self.pool.release(result);
        place.release(&mut self.pool);

        code.extend(call);
        ast.get_mut(stat).code = code;
        Ok(())
    }

    fn gen_write_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let expr = ast.children(stat)[0];
        self.gen_expr(ast, expr)?;
        self.program.reserve("buf", 20, "getstr/strint scratch buffer");
        self.program.constant("nl", &[13, 10, 0], "nl = \"\\r\\n\\0\"");

        let mut code = ast.get(expr).code.clone();
        let place = node_place(ast, expr);
        let own_size = frame_size(self.ctx, self.table);

        let value = self.pool.acquire()?;
        self.load_place(&mut code, &place, value.name())?;
        place.release(&mut self.pool);

        code.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), own_size.to_string()]));
        code.push(Line::new("sw", vec![format!("-{}(r14)", own_size + 4), value.name().to_string()]));
        self.pool.release(value);
        code.push(Line::new("jl", vec!["r15".to_string(), "intstr".to_string()]));
        code.push(Line::new("sw", vec![format!("-{}(r14)", own_size + 8), format!("-{own_size}(r14)")]));
        code.push(Line::new("jl", vec!["r15".to_string(), "putstr".to_string()]));

        let nl_reg = self.pool.acquire()?;
        code.push(Line::new("addi", vec![nl_reg.name().to_string(), "r0".to_string(), "nl".to_string()]));
        code.push(Line::new("sw", vec![format!("-{}(r14)", own_size + 4), nl_reg.name().to_string()]));
        self.pool.release(nl_reg);
        code.push(Line::new("jl", vec!["r15".to_string(), "putstr".to_string()]));
        code.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), format!("-{own_size}")]));

        ast.get_mut(stat).code = code;
        Ok(())
    }

    fn gen_return_stat(&mut self, ast: &mut Ast, stat: NodeId) -> Result<(), CodegenError> {
        let expr = ast.children(stat)[0];
        self.gen_expr(ast, expr)?;
        let place = node_place(ast, expr);

        let mut code = ast.get(expr).code.clone();
        let reg = self.pool.acquire()?;
        self.load_place(&mut code, &place, reg.name())?;
        place.release(&mut self.pool);
        code.push(Line::new("sw", vec!["0(r14)".to_string(), reg.name().to_string()]));
        self.pool.release(reg);

        let scope = self.scope_name();
        let label = self.mangler.func_label(&scope);
        code.push(Line::new("j", vec![format!("{label}return")]));

        ast.get_mut(stat).code = code;
        Ok(())
    }

    fn gen_rel_expr(&mut self, ast: &mut Ast, node: NodeId) -> Result<(), CodegenError> {
        let children = ast.children(node).to_vec();
        let (left, right) = (children[0], children[1]);
        self.gen_expr(ast, right)?;
        self.gen_expr(ast, left)?;

        let mut code = ast.get(right).code.clone();
        code.extend(ast.get(left).code.iter().cloned());

        let left_place = node_place(ast, left);
        let right_place = node_place(ast, right);
        let left_reg = self.pool.acquire()?;
        self.load_place(&mut code, &left_place, left_reg.name())?;
        let right_reg = self.pool.acquire()?;
        self.load_place(&mut code, &right_place, right_reg.name())?;
        left_place.release(&mut self.pool);
        right_place.release(&mut self.pool);

        let op = ast.get(node).token.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Eq);
        let result = self.pool.acquire()?;
        code.push(Line::new(
            op_instruction(op),
            vec![result.name().to_string(), left_reg.name().to_string(), right_reg.name().to_string()],
        ));
        self.pool.release(left_reg);
        self.pool.release(right_reg);
        self.pool.release(result);

        ast.get_mut(node).code = code;
        Ok(())
    }

    fn gen_dyadic_expr(&mut self, ast: &mut Ast, node: NodeId) -> Result<(), CodegenError> {
        let children = ast.children(node).to_vec();
        let (left, right) = (children[0], children[1]);
        self.gen_expr(ast, right)?;
        self.gen_expr(ast, left)?;

        let mut code = ast.get(right).code.clone();
        code.extend(ast.get(left).code.iter().cloned());

        let left_place = node_place(ast, left);
        let right_place = node_place(ast, right);
        let left_reg = self.pool.acquire()?;
        self.load_place(&mut code, &left_place, left_reg.name())?;
        let right_reg = self.pool.acquire()?;
        self.load_place(&mut code, &right_place, right_reg.name())?;
        left_place.release(&mut self.pool);
        right_place.release(&mut self.pool);

        let op = ast.get(node).token.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Plus);
        let result = self.pool.acquire()?;
        code.push(Line::new(
            op_instruction(op),
            vec![result.name().to_string(), left_reg.name().to_string(), right_reg.name().to_string()],
        ));
        self.pool.release(left_reg);
        self.pool.release(right_reg);

        let record = ast
            .get(node)
            .temp_record
            .clone()
            .ok_or_else(|| CodegenError::Internal("arithmetic node has no result temp".into()))?;
        code.push(Line::new("sw", vec![record.memory_location(), result.name().to_string()]));
        self.pool.release(result);

        ast.get_mut(node).code = code;
        Ok(())
    }

    fn gen_unary(&mut self, ast: &mut Ast, node: NodeId) -> Result<(), CodegenError> {
        let inner = ast.children(node)[0];
        self.gen_expr(ast, inner)?;

        let mut code = ast.get(inner).code.clone();
        let place = node_place(ast, inner);
        let inner_reg = self.pool.acquire()?;
        self.load_place(&mut code, &place, inner_reg.name())?;
        place.release(&mut self.pool);

        let op = ast.get(node).token.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Not);
        let result = self.pool.acquire()?;
        match op {
            TokenKind::Minus => code.push(Line::new("sub", vec![result.name().to_string(), "r0".to_string(), inner_reg.name().to_string()])),
            TokenKind::Plus => code.push(Line::new("add", vec![result.name().to_string(), "r0".to_string(), inner_reg.name().to_string()])),
            _ => code.push(Line::new("not", vec![result.name().to_string(), inner_reg.name().to_string()])),
        }
        self.pool.release(inner_reg);

        if let Some(record) = ast.get(node).temp_record.clone() {
            code.push(Line::new("sw", vec![record.memory_location(), result.name().to_string()]));
        }
        self.pool.release(result);

        ast.get_mut(node).code = code;
        Ok(())
    }

    /// Walks a `var`/`f_call_stat` chain left to right, generating code for
    /// every segment and returning the final segment's `Place`. `code` is
    /// appended to in source order so the caller can attach the whole
    /// chain's code to the chain node itself.
    fn gen_var_chain(&mut self, ast: &mut Ast, chain: NodeId, code: &mut Vec<Line>) -> Result<Place, CodegenError> {
        let segments = ast.children(chain).to_vec();
        let mut cursor = Cursor::Frame(0);

        for (i, &segment) in segments.iter().enumerate() {
            match ast.get(segment).kind {
                NodeKind::DataMember => {
                    cursor = self.gen_data_member(ast, segment, i, cursor, code)?;
                }
                NodeKind::FCall => {
                    cursor = self.gen_f_call(ast, segment, i, cursor, code)?;
                }
                _ => {}
            }
        }

        Ok(cursor.into_place())
    }

    fn gen_data_member(
        &mut self,
        ast: &mut Ast,
        segment: NodeId,
        index: usize,
        cursor: Cursor,
        code: &mut Vec<Line>,
    ) -> Result<Cursor, CodegenError> {
        let record = ast
            .get(segment)
            .record
            .clone()
            .ok_or_else(|| CodegenError::Internal("data member segment has no record".into()))?;

        let base = if index == 0 {
            self.gen_chain_root(code, &record)?
        } else {
            let field_offset = record.offset.unwrap_or(0);
            cursor.advance(self, code, field_offset)?
        };

        let index_list = ast.children(segment)[1];
        let indices = ast.children(index_list).to_vec();
        if indices.is_empty() {
            return Ok(base);
        }

        let addr = base.into_address(self, code)?;
        for (dim, &idx_node) in indices.iter().enumerate() {
            self.gen_expr(ast, idx_node)?;
            code.extend(ast.get(idx_node).code.iter().cloned());
            let idx_place = node_place(ast, idx_node);
            let idx_reg = self.pool.acquire()?;
            self.load_place(code, &idx_place, idx_reg.name())?;
            idx_place.release(&mut self.pool);

            let mul = record.ty.mul_for_dim(dim, self.ctx);
            code.push(Line::new("muli", vec![idx_reg.name().to_string(), idx_reg.name().to_string(), mul.to_string()]));
            code.push(Line::new("sub", vec![addr.name().to_string(), addr.name().to_string(), idx_reg.name().to_string()]));
            self.pool.release(idx_reg);
        }

        let temp = ast
            .get(segment)
            .temp_record
            .clone()
            .ok_or_else(|| CodegenError::Internal("indexed segment has no dynamic-offset temp".into()))?;
        code.push(Line::new("sw", vec![temp.memory_location(), addr.name().to_string()]));
        self.pool.release(addr);

        Ok(Cursor::Temp(temp))
    }

    /// The very first segment of a chain: either an ordinary frame-relative
    /// record (local, param, or static data member of the current class
    /// reached through the implicit `this` pointer), or a pointer parameter
    /// whose slot must be dereferenced once before any field offset applies.
    fn gen_chain_root(&mut self, code: &mut Vec<Line>, record: &Record) -> Result<Cursor, CodegenError> {
        if record.kind == RecordKind::Data {
            let this_reg = self.pool.acquire()?;
            code.push(Line::new("lw", vec![this_reg.name().to_string(), "-8(r14)".to_string()]));
            return Ok(Cursor::Reg(this_reg, record.offset.unwrap_or(0)));
        }
        if record.is_pointer() {
            let reg = self.pool.acquire()?;
            code.push(Line::new("lw", vec![reg.name().to_string(), record.memory_location()]));
            return Ok(Cursor::Reg(reg, 0));
        }
        Ok(Cursor::Frame(record.offset.unwrap_or(0)))
    }

    fn gen_f_call(&mut self, ast: &mut Ast, segment: NodeId, index: usize, cursor: Cursor, code: &mut Vec<Line>) -> Result<Cursor, CodegenError> {
        let record = ast
            .get(segment)
            .record
            .clone()
            .ok_or_else(|| CodegenError::Internal("call segment has no record".into()))?;
        let callee_table = record
            .table
            .ok_or_else(|| CodegenError::Internal("call segment's function record has no table".into()))?;
        let is_method = !self.ctx.table(callee_table).inherits.is_empty();
        let callee_name = self.ctx.table(callee_table).name.clone();
        let label = self.mangler.func_label(&callee_name);

        let own_size = frame_size(self.ctx, self.table);
        code.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), own_size.to_string()]));

        // `cursor` is only ever non-trivial (holds a live register) when
        // this segment follows an explicit receiver (`index != 0`); that is
        // exactly the case consumed below, so it is never released twice.
        let mut cursor = Some(cursor);
        let mut offset = 8i32;
        if is_method {
            let this_reg = if index == 0 {
                // Implicit receiver: the method being called was found
                // through this function's own private self-access, so the
                // object is this function's own incoming `this` pointer.
                let reg = self.pool.acquire()?;
                code.push(Line::new("lw", vec![reg.name().to_string(), format!("-{}(r14)", own_size + 8)]));
                reg
            } else {
                cursor.take().unwrap().into_address(self, code)?
            };
            code.push(Line::new("sw", vec![format!("-{offset}(r14)"), this_reg.name().to_string()]));
            self.pool.release(this_reg);
            offset += 4;
        }

        let arg_list = ast.children(segment)[1];
        for &arg in ast.children(arg_list).to_vec().iter() {
            self.gen_expr(ast, arg)?;
            code.extend(ast.get(arg).code.iter().cloned());
            let place = node_place(ast, arg);
            let (is_complex, size) = node_type_shape(ast, arg);
            if is_complex {
                let addr = self.place_address(code, &place)?;
                code.push(Line::new("sw", vec![format!("-{offset}(r14)"), addr.name().to_string()]));
                self.pool.release(addr);
            } else {
                let reg = self.pool.acquire()?;
                self.load_place(code, &place, reg.name())?;
                code.push(Line::new("sw", vec![format!("-{offset}(r14)"), reg.name().to_string()]));
                self.pool.release(reg);
            }
            place.release(&mut self.pool);
            offset += size as i32;
        }

        code.push(Line::new("jl", vec!["r15".to_string(), label]));
        code.push(Line::new("addi", vec!["r14".to_string(), "r14".to_string(), format!("-{own_size}")]));

        if let Some(c) = cursor.take() {
            c.release(&mut self.pool);
        }

        if record.ty.base == BaseType::Void {
            return Ok(Cursor::Frame(0));
        }
        let temp = ast
            .get(segment)
            .temp_record
            .clone()
            .ok_or_else(|| CodegenError::Internal("non-void call segment has no result temp".into()))?;
        Ok(Cursor::Frame(temp.offset.unwrap_or(0)))
    }
}

/// Where the chain has reached after zero or more segments: either still
/// frame-relative (`offset` from `r14`), or resolved through a register
/// holding a base address (`offset` from that register), or spilled to an
/// indexed-access temp slot holding an exact address (offset always 0).
#[derive(Clone)]
enum Cursor {
    Frame(i32),
    Reg(Reg, i32),
    Temp(Record),
}

impl Cursor {
    /// Adds a further static field offset on top of wherever this cursor
    /// currently points — valid because class-typed values (whether in the
    /// frame or through a pointer) lay their own data members out
    /// contiguously, so a later segment's offset simply adds to the
    /// running total.
    fn advance(self, fb: &mut FuncBuilder, code: &mut Vec<Line>, field_offset: i32) -> Result<Cursor, CodegenError> {
        Ok(match self {
            Cursor::Frame(o) => Cursor::Frame(o + field_offset),
            Cursor::Reg(r, o) => Cursor::Reg(r, o + field_offset),
            Cursor::Temp(temp) => {
                let reg = fb.pool.acquire()?;
                code.push(Line::new("lw", vec![reg.name().to_string(), temp.memory_location()]));
                Cursor::Reg(reg, field_offset)
            }
        })
    }

    /// Materializes this cursor as a register holding the exact address it
    /// represents, consuming it. The caller owns the returned register.
    fn into_address(self, fb: &mut FuncBuilder, code: &mut Vec<Line>) -> Result<Reg, CodegenError> {
        match self {
            Cursor::Frame(o) => {
                let reg = fb.pool.acquire()?;
                code.push(Line::new("addi", vec![reg.name().to_string(), "r14".to_string(), (-o).to_string()]));
                Ok(reg)
            }
            Cursor::Reg(r, 0) => Ok(r),
            Cursor::Reg(r, o) => {
                code.push(Line::new("addi", vec![r.name().to_string(), r.name().to_string(), (-o).to_string()]));
                Ok(r)
            }
            Cursor::Temp(temp) => {
                let reg = fb.pool.acquire()?;
                code.push(Line::new("lw", vec![reg.name().to_string(), temp.memory_location()]));
                Ok(reg)
            }
        }
    }

    fn release(self, pool: &mut RegisterPool) {
        if let Cursor::Reg(r, _) = self {
            pool.release(r);
        }
    }

    fn into_place(self) -> Place {
        match self {
            Cursor::Frame(o) => Place::Frame(frame_record_at(o)),
            Cursor::Reg(r, o) => Place::ThroughAddress(r, o),
            Cursor::Temp(temp) => Place::ThroughTemp(temp),
        }
    }
}

/// A synthetic frame-relative record carrying only the offset `Place::Frame`
/// needs — used when the chain's final result is a plain `r14`-relative
/// slot that was computed, not read directly off an AST node's own record.
fn frame_record_at(offset: i32) -> Record {
    let mut record = Record::new(
        moonc_core::Symbol::from_raw(0),
        SymbolType::scalar(BaseType::Integer),
        RecordKind::Temp,
        moonc_core::Location::new(1, 1),
    );
    record.offset = Some(offset);
    record
}

/// The `Place` a node's own attachments describe: a dynamic-offset temp
/// takes priority (array indexing, a non-void call result), then a static
/// record (a pointer parameter dereferences once, anything else is a plain
/// frame slot), then a bare literal token.
fn node_place(ast: &Ast, node: NodeId) -> Place {
    let n = ast.get(node);
    if let Some(temp) = &n.temp_record {
        return Place::ThroughTemp(temp.clone());
    }
    if let Some(record) = &n.record {
        return if record.is_pointer() {
            Place::ThroughPointer(record.clone())
        } else {
            Place::Frame(record.clone())
        };
    }
    if ast.get(node).kind == NodeKind::Var {
        // A var chain with no temp/record of its own leaves its result in
        // the code it just generated; gen_var_chain returns that Place
        // directly rather than going through node_place, so this branch is
        // only reached if a caller mistakenly re-derives it from the node.
    }
    if let Some(token) = &n.token {
        return Place::Literal(token.lexeme.clone());
    }
    Place::Literal("0".to_string())
}

/// `(is_complex, size_in_bytes)` for an already-type-checked expression
/// node, used to decide how a call argument is passed and by how much the
/// outgoing-argument offset advances afterwards.
fn node_type_shape(ast: &Ast, node: NodeId) -> (bool, u32) {
    let ty = ast
        .get(node)
        .temp_record
        .as_ref()
        .map(|r| &r.ty)
        .or(ast.get(node).record.as_ref().map(|r| &r.ty));
    match ty {
        Some(ty) if ty.is_complex() => (true, 4),
        Some(ty) => (false, size_hint(ty)),
        None => (false, 4),
    }
}

fn size_hint(ty: &SymbolType) -> u32 {
    match ty.base {
        BaseType::Float => 8,
        _ => 4,
    }
}
