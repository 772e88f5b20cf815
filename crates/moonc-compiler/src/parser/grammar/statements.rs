//! Statements and statement blocks.

use moonc_core::Location;

use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

use super::super::Parser;
use super::FIRST_STATEMENT;

const FOLLOW_STATEMENT: &[TokenKind] = &[TokenKind::CloseCbr, TokenKind::End, TokenKind::Else];

impl<'a> Parser<'a> {
    /// `stat_block -> statement*`. Used where the caller has already
    /// consumed the block's own delimiters (`func_def`/`main_body`'s `{`
    /// and `}`, or `do`/`end`).
    pub(crate) fn parse_stat_block(&mut self) -> NodeId {
        let mut children = Vec::new();
        while FIRST_STATEMENT.contains(&self.current_kind()) {
            children.push(self.parse_statement());
        }
        if children.is_empty() {
            self.derive_epsilon("stat_block");
        } else {
            self.derive("stat_block", vec!["statement".into(), "stat_block".into()]);
        }
        self.list(NodeKind::StatBlock, children)
    }

    /// `stat_block -> '{' statement* '}' | statement | epsilon`, the form
    /// used for `if`/`while` bodies, which may be braced, a single bare
    /// statement, or empty.
    fn parse_nested_stat_block(&mut self) -> NodeId {
        if self.at(TokenKind::OpenCbr) {
            self.advance();
            let block = self.parse_stat_block();
            self.expect(TokenKind::CloseCbr);
            self.derive("stat_block", vec!["{".into(), "stat_block".into(), "}".into()]);
            block
        } else if FIRST_STATEMENT.contains(&self.current_kind()) {
            let stat = self.parse_statement();
            self.derive("stat_block", vec!["statement".into()]);
            self.list(NodeKind::StatBlock, vec![stat])
        } else {
            self.derive_epsilon("stat_block");
            self.list(NodeKind::StatBlock, Vec::new())
        }
    }

    /// `statement -> if_stat | while_stat | read_stat | write_stat |
    /// return_stat | assign_stat | f_call_stat`
    pub(crate) fn parse_statement(&mut self) -> NodeId {
        if !self.sync("statement", FIRST_STATEMENT, FOLLOW_STATEMENT, true) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        match self.current_kind() {
            TokenKind::If => self.parse_if_stat(),
            TokenKind::While => self.parse_while_stat(),
            TokenKind::Read => self.parse_read_stat(),
            TokenKind::Write => self.parse_write_stat(),
            TokenKind::Return => self.parse_return_stat(),
            TokenKind::Id => self.parse_assign_or_call_stat(),
            _ => self.leaf(NodeKind::Epsilon, None),
        }
    }

    /// `if_stat -> 'if' '(' expr ')' 'then' stat_block 'else' stat_block ';'`
    fn parse_if_stat(&mut self) -> NodeId {
        self.advance();
        self.expect(TokenKind::OpenPar);
        let cond = self.parse_expr();
        self.expect(TokenKind::ClosePar);
        self.expect(TokenKind::Then);
        let then_block = self.parse_nested_stat_block();
        self.expect(TokenKind::Else);
        let else_block = self.parse_nested_stat_block();
        self.expect(TokenKind::SemiColon);
        self.derive(
            "if_stat",
            vec![
                "if".into(),
                "(".into(),
                "expr".into(),
                ")".into(),
                "then".into(),
                "stat_block".into(),
                "else".into(),
                "stat_block".into(),
                ";".into(),
            ],
        );
        self.group(NodeKind::IfStat, vec![cond, then_block, else_block])
    }

    /// `while_stat -> 'while' '(' expr ')' stat_block ';'`
    fn parse_while_stat(&mut self) -> NodeId {
        self.advance();
        self.expect(TokenKind::OpenPar);
        let cond = self.parse_expr();
        self.expect(TokenKind::ClosePar);
        let body = self.parse_nested_stat_block();
        self.expect(TokenKind::SemiColon);
        self.derive(
            "while_stat",
            vec![
                "while".into(),
                "(".into(),
                "expr".into(),
                ")".into(),
                "stat_block".into(),
                ";".into(),
            ],
        );
        self.group(NodeKind::WhileStat, vec![cond, body])
    }

    /// `read_stat -> 'read' '(' var ')' ';'`
    fn parse_read_stat(&mut self) -> NodeId {
        self.advance();
        self.expect(TokenKind::OpenPar);
        let segments = self.parse_chain_segments();
        let var = self.list(NodeKind::Var, segments);
        self.expect(TokenKind::ClosePar);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "read_stat",
            vec!["read".into(), "(".into(), "var".into(), ")".into(), ";".into()],
        );
        self.group(NodeKind::ReadStat, vec![var])
    }

    /// `write_stat -> 'write' '(' expr ')' ';'`
    fn parse_write_stat(&mut self) -> NodeId {
        self.advance();
        self.expect(TokenKind::OpenPar);
        let expr = self.parse_expr();
        self.expect(TokenKind::ClosePar);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "write_stat",
            vec!["write".into(), "(".into(), "expr".into(), ")".into(), ";".into()],
        );
        self.group(NodeKind::WriteStat, vec![expr])
    }

    /// `return_stat -> 'return' '(' expr ')' ';'`
    fn parse_return_stat(&mut self) -> NodeId {
        self.advance();
        self.expect(TokenKind::OpenPar);
        let expr = self.parse_expr();
        self.expect(TokenKind::ClosePar);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "return_stat",
            vec!["return".into(), "(".into(), "expr".into(), ")".into(), ";".into()],
        );
        self.group(NodeKind::ReturnStat, vec![expr])
    }

    /// `assign_stat -> var ':=' expr ';'` or `f_call_stat -> var ';'`,
    /// disambiguated after parsing the shared chain by whether `:=`
    /// follows. The chain's final segment must match what the caller
    /// turned out to need (`DATA_MEMBER` for assignment, `F_CALL` for a
    /// bare call statement); a mismatch is reported but parsing continues
    /// with whatever shape was actually present.
    fn parse_assign_or_call_stat(&mut self) -> NodeId {
        let start = self.location();
        let segments = self.parse_chain_segments();
        let last_kind = segments.last().map(|&id| self.ast.get(id).kind);
        if self.at(TokenKind::Assign) {
            self.advance();
            let expr = self.parse_expr();
            self.expect(TokenKind::SemiColon);
            if last_kind != Some(NodeKind::DataMember) {
                self.report_chain_shape_error(start, "an assignment target must end in a data member, not a call");
            }
            let var = self.list(NodeKind::Var, segments);
            self.derive(
                "assign_stat",
                vec!["var".into(), ":=".into(), "expr".into(), ";".into()],
            );
            self.group(NodeKind::AssignStat, vec![var, expr])
        } else {
            self.expect(TokenKind::SemiColon);
            if last_kind != Some(NodeKind::FCall) {
                self.report_chain_shape_error(start, "a call statement must end in a function call");
            }
            self.derive("f_call_stat", vec!["var".into(), ";".into()]);
            self.list(NodeKind::FCallStat, segments)
        }
    }

    fn report_chain_shape_error(&mut self, loc: Location, message: &str) {
        self.diagnostics.error(loc, format!("Syntax error: {message}"));
    }
}
