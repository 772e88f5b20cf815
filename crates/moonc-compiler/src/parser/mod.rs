//! Predictive recursive-descent parser with panic-mode recovery.
//!
//! One method per non-terminal (split across `grammar/*` by the part of
//! the language it covers). Every method is guarded by [`Parser::sync`],
//! the inline stand-in for the spec's "decorator": check the lookahead
//! against the rule's FIRST set (extended with FOLLOW when the rule is
//! nullable) and, on mismatch, skip tokens until one lands in FIRST ∪
//! FOLLOW before retrying. `class_decl`, `func_def`, `member_decl`,
//! `var_decl`, and `statement` are the sync points that also mark the
//! overall parse failed when recovery actually skips a token; other
//! rules recover silently.

mod derivation;
mod grammar;

use moonc_core::Location;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenKind};

pub use derivation::{DerivationTrace, Production};

/// Parses a filtered token stream (comments already removed) into an AST.
///
/// `succeeded` is true only if every rule matched without panic-mode
/// recovery and the final lookahead was `Eof`, per `prog`'s success rule.
pub struct ParseResult {
    pub ast: Ast,
    pub diagnostics: Diagnostics,
    pub derivation: DerivationTrace,
    pub succeeded: bool,
}

/// Parses a full token stream (as produced by [`crate::scanner::Scanner`])
/// into a [`ParseResult`]. Comments and the scanner's sentinel `Eof` tail
/// are handled internally; callers just hand over whatever the scanner
/// produced.
pub fn parse(tokens: &[Token]) -> ParseResult {
    let filtered: Vec<Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).cloned().collect();
    let mut parser = Parser::new(&filtered);
    let root = parser.parse_prog();
    parser.ast.root = root;
    let succeeded = !parser.failed && parser.current_kind() == TokenKind::Eof;
    ParseResult {
        ast: parser.ast,
        diagnostics: parser.diagnostics,
        derivation: parser.derivation,
        succeeded: succeeded && root.is_some(),
    }
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub(crate) ast: Ast,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) derivation: DerivationTrace,
    pub(crate) failed: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
            diagnostics: Diagnostics::new(),
            derivation: DerivationTrace::new(),
            failed: false,
        }
    }

    pub(crate) fn current(&self) -> &Token {
        // The scanner always terminates in `Eof`, and `advance` refuses to
        // step past it, so `pos` is always in bounds.
        &self.tokens[self.pos]
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn location(&self) -> Location {
        self.current().location
    }

    /// Looks `offset` tokens beyond the current one without consuming.
    /// Used only to disambiguate `type id` (a declaration) from a bare
    /// `id` (the start of a statement) when both begin with `Id`.
    pub(crate) fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Consumes and returns the current token, unless it is `Eof`.
    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consumes the current token if it matches `kind`, reporting an error
    /// otherwise. Per §4.2, a missing `;` is forgiven: the parser reports
    /// the error and continues without advancing, rather than entering
    /// panic mode.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else if kind == TokenKind::SemiColon {
            self.diagnostics.error(
                self.location(),
                format!("Syntax error: missing ';' before '{}'", self.current().lexeme),
            );
            None
        } else {
            self.diagnostics.error(
                self.location(),
                format!(
                    "Syntax error: expected '{:?}' but found '{}'",
                    kind,
                    self.current().lexeme
                ),
            );
            None
        }
    }

    /// The panic-mode guard run at the entry of every grammar method.
    ///
    /// Returns `true` once the lookahead is in `first` (either already, or
    /// after skipping tokens until `first ∪ follow` is reached). Returns
    /// `false` when recovery instead lands on a `follow` token (the rule
    /// is treated as matching nothing, i.e. an epsilon production) or on
    /// `Eof`. `sync_point` rules additionally flag the whole parse as
    /// failed whenever recovery actually discards a token.
    pub(crate) fn sync(&mut self, rule: &str, first: &[TokenKind], follow: &[TokenKind], sync_point: bool) -> bool {
        if first.contains(&self.current_kind()) {
            return true;
        }
        let start_loc = self.location();
        let mut skipped = Vec::new();
        while !first.contains(&self.current_kind())
            && !follow.contains(&self.current_kind())
            && !self.at(TokenKind::Eof)
        {
            skipped.push(self.advance().lexeme);
        }
        if sync_point {
            self.failed = true;
        }
        self.diagnostics.error(
            start_loc,
            format!(
                "Syntax error: unexpected token while parsing {rule}; skipped [{}]",
                skipped.join(", ")
            ),
        );
        first.contains(&self.current_kind())
    }

    /// Records `lhs → rhs` in the derivation trace. `rhs` lists each
    /// symbol, non-terminals as their rule name, terminals as their
    /// matched lexeme (or the literal token kind when no lexeme applies).
    pub(crate) fn derive(&mut self, lhs: &'static str, rhs: Vec<String>) {
        self.derivation.push(Production::new(lhs, rhs));
    }

    pub(crate) fn derive_epsilon(&mut self, lhs: &'static str) {
        self.derivation.push(Production::epsilon(lhs));
    }

    pub(crate) fn leaf(&mut self, kind: NodeKind, token: Option<Token>) -> NodeId {
        self.ast.leaf(kind, token)
    }

    pub(crate) fn group(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        self.ast.group(kind, children)
    }

    pub(crate) fn group_with_token(&mut self, kind: NodeKind, token: Option<Token>, children: Vec<NodeId>) -> NodeId {
        self.ast.group_with_token(kind, token, children)
    }

    pub(crate) fn list(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        self.ast.list(kind, children)
    }
}
