//! Pure formatters for the `.outXXX` file artifacts (§6).
//!
//! Each is a `fn format(&T) -> String` with no filesystem access, so the CLI
//! layer's job is reduced to "write this string to `name.<suffix>`" and
//! these stay unit-testable without a temp directory.

use moonc_core::{CompilationContext, SymbolType, TableId};

use crate::ast::{Ast, NodeId};
use crate::diagnostics::Diagnostics;
use crate::parser::DerivationTrace;
use crate::token::Token;

/// `.outlextokens`: tokens grouped by line, each formatted
/// `[kind, lexeme, line:col]` (already [`Token`]'s own `Display`), tokens on
/// the same line joined by a single space, lines joined by `\n`.
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut current_line: Option<u32> = None;
    for token in tokens.iter().filter(|t| !t.kind.is_error()) {
        match current_line {
            Some(line) if line == token.location.line => out.push(' '),
            Some(_) => out.push('\n'),
            None => {}
        }
        out.push_str(&token.to_string());
        current_line = Some(token.location.line);
    }
    out
}

/// `.outlexerrors`: one `Lexical Error: ...` line per error token, in scan
/// order (already [`Token`]'s own `Display` for error kinds).
pub fn format_lex_errors(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind.is_error())
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `.outderivation`: one applied production per line, `lhs -> rhs`
/// (`Production`'s own `Display`), `EPSILON` for an epsilon production.
pub fn format_derivation(trace: &DerivationTrace) -> String {
    trace.productions().iter().map(|p| p.to_string()).collect::<Vec<_>>().join("\n")
}

/// `.outderivation.var`: the sentential forms obtained by repeatedly
/// substituting the leftmost non-terminal, one per line. Only meaningful
/// (and only written by the CLI) when the parse succeeded.
pub fn format_derivation_var(trace: &DerivationTrace) -> String {
    trace.sentential_forms().join("\n")
}

/// `.outast`: the AST as indented, XML-like tags (`<kind token="…">…</kind>`),
/// two spaces per nesting level; nodes with no children self-close.
pub fn format_ast(ast: &Ast) -> String {
    let mut out = String::new();
    if let Some(root) = ast.root {
        write_ast_node(&mut out, ast, root, 0);
    }
    out
}

fn write_ast_node(out: &mut String, ast: &Ast, id: NodeId, depth: usize) {
    let node = ast.get(id);
    let indent = "  ".repeat(depth);
    let tag = node.kind.tag();
    let attr = node
        .token
        .as_ref()
        .map(|t| format!(" token=\"{}\"", t.display_lexeme()))
        .unwrap_or_default();
    let children = ast.children(id);
    if children.is_empty() {
        out.push_str(&format!("{indent}<{tag}{attr}/>\n"));
    } else {
        out.push_str(&format!("{indent}<{tag}{attr}>\n"));
        for &child in children {
            write_ast_node(out, ast, child, depth + 1);
        }
        out.push_str(&format!("{indent}</{tag}>\n"));
    }
}

/// `.outsyntaxerrors` / `.outsemanticerrors`: every collected diagnostic,
/// sorted by `(line, column)`, one per line, warnings interleaved with
/// errors in location order (§7).
pub fn format_diagnostics(diagnostics: &Diagnostics) -> String {
    diagnostics.sorted().iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n")
}

fn type_string(ctx: &CompilationContext, ty: &SymbolType) -> String {
    let mut s = ty.base.name(ctx).to_string();
    for dim in &ty.dims {
        match dim {
            Some(n) => s.push_str(&format!("[{n}]")),
            None => s.push_str("[]"),
        }
    }
    s
}

struct Row {
    kind: String,
    name: String,
    ty: String,
    visibility: String,
    offset: String,
}

/// `.outsymboltables`: one box-drawn table per entry in the compilation's
/// table arena (globals first, then every class/function/method table in
/// allocation order), each row listing an entry's kind, name, type,
/// visibility and offset.
pub fn format_symbol_tables(ctx: &CompilationContext) -> String {
    let mut out = String::new();
    for table_id in ctx.table_ids() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format_one_table(ctx, table_id));
    }
    out
}

fn format_one_table(ctx: &CompilationContext, table_id: TableId) -> String {
    let table = ctx.table(table_id);
    let title = format!("table: {}", table.name);

    let mut rows = vec![Row {
        kind: "kind".to_string(),
        name: "name".to_string(),
        ty: "type".to_string(),
        visibility: "vis".to_string(),
        offset: "offset".to_string(),
    }];
    for record in table.entries_in_order() {
        rows.push(Row {
            kind: record.kind.to_string(),
            name: ctx.interner.resolve(record.name).to_string(),
            ty: type_string(ctx, &record.ty),
            visibility: record.visibility.map(|v| v.to_string()).unwrap_or_default(),
            offset: record.offset.map(|o| o.to_string()).unwrap_or_default(),
        });
    }

    let w_kind = rows.iter().map(|r| r.kind.len()).max().unwrap_or(0);
    let w_name = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let w_ty = rows.iter().map(|r| r.ty.len()).max().unwrap_or(0);
    let w_vis = rows.iter().map(|r| r.visibility.len()).max().unwrap_or(0);
    let w_off = rows.iter().map(|r| r.offset.len()).max().unwrap_or(0);
    let inner_width = w_kind + w_name + w_ty + w_vis + w_off + 13; // 4 separators * 3 chars + 1

    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", "─".repeat(inner_width.max(title.len() + 2))));
    out.push_str(&format!("│ {:<width$} │\n", title, width = inner_width.max(title.len() + 2) - 2));
    out.push_str(&format!(
        "├{}┬{}┬{}┬{}┬{}┤\n",
        "─".repeat(w_kind + 2),
        "─".repeat(w_name + 2),
        "─".repeat(w_ty + 2),
        "─".repeat(w_vis + 2),
        "─".repeat(w_off + 2)
    ));
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:<w_kind$} │ {:<w_name$} │ {:<w_ty$} │ {:<w_vis$} │ {:<w_off$} │\n",
            row.kind, row.name, row.ty, row.visibility, row.offset
        ));
        if i == 0 {
            out.push_str(&format!(
                "├{}┼{}┼{}┼{}┼{}┤\n",
                "─".repeat(w_kind + 2),
                "─".repeat(w_name + 2),
                "─".repeat(w_ty + 2),
                "─".repeat(w_vis + 2),
                "─".repeat(w_off + 2)
            ));
        }
    }
    out.push_str(&format!(
        "└{}┴{}┴{}┴{}┴{}┘\n",
        "─".repeat(w_kind + 2),
        "─".repeat(w_name + 2),
        "─".repeat(w_ty + 2),
        "─".repeat(w_vis + 2),
        "─".repeat(w_off + 2)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Production};
    use crate::scanner::Scanner;
    use crate::token::TokenKind;

    #[test]
    fn format_tokens_groups_by_line() {
        let tokens = Scanner::tokenize("integer a;\ninteger b;");
        let rendered = format_tokens(&tokens);
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.lines().next().unwrap().contains("integer"));
    }

    #[test]
    fn format_lex_errors_only_includes_error_tokens() {
        let tokens = Scanner::tokenize("1abc");
        let rendered = format_lex_errors(&tokens);
        assert!(rendered.starts_with("Lexical Error: Invalid identifier"));
    }

    #[test]
    fn format_derivation_round_trips_epsilon() {
        let mut trace = DerivationTrace::new();
        trace.push(Production::epsilon("opt_class_list"));
        assert_eq!(format_derivation(&trace), "opt_class_list -> EPSILON");
    }

    #[test]
    fn format_ast_self_closes_leaves() {
        let tokens = Scanner::tokenize("main do end");
        let result = parse(&tokens);
        let rendered = format_ast(&result.ast);
        assert!(rendered.contains("<main>"));
        assert!(rendered.contains("</main>"));
    }

    #[test]
    fn format_diagnostics_is_empty_when_clean() {
        let diagnostics = Diagnostics::new();
        assert_eq!(format_diagnostics(&diagnostics), "");
    }

    #[test]
    fn format_symbol_tables_includes_globals() {
        let ctx = CompilationContext::new();
        let rendered = format_symbol_tables(&ctx);
        assert!(rendered.contains("table: global"));
    }

    #[test]
    fn token_kind_sanity() {
        let tokens = Scanner::tokenize("42");
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
    }
}
