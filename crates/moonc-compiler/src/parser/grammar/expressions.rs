//! Expressions: `expr`, the `add_expr`/`mult_expr` binary chains, unary
//! `not`/`sign`, and the shared variable/call chain used by factors,
//! assignment targets, and call statements.

use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

use super::super::Parser;
use super::{ADD_OPS, FIRST_FACTOR, MULT_OPS, REL_OPS};

impl<'a> Parser<'a> {
    /// `expr -> arith_expr (rel_op arith_expr)?`
    pub(crate) fn parse_expr(&mut self) -> NodeId {
        if !self.sync("expr", FIRST_FACTOR, &[], false) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        let left = self.parse_arith_expr();
        if REL_OPS.contains(&self.current_kind()) {
            let op = self.advance();
            let right = self.parse_arith_expr();
            self.derive("expr", vec!["arith_expr".into(), format!("{}", op.kind), "arith_expr".into()]);
            self.group_with_token(NodeKind::RelExpr, Some(op), vec![left, right])
        } else {
            self.derive("expr", vec!["arith_expr".into()]);
            left
        }
    }

    /// `arith_expr -> term (add_op term)*`, folded left-to-right as each
    /// `add_op term` pair is consumed so the result is already left-leaning
    /// (`a - b - c` → `((a - b) - c)`) without a separate rotation pass.
    pub(crate) fn parse_arith_expr(&mut self) -> NodeId {
        let mut left = self.parse_term();
        while ADD_OPS.contains(&self.current_kind()) {
            let op = self.advance();
            let right = self.parse_term();
            self.derive("arith_expr", vec!["arith_expr".into(), format!("{}", op.kind), "term".into()]);
            left = self.group_with_token(NodeKind::AddExpr, Some(op), vec![left, right]);
        }
        if !ADD_OPS.contains(&self.current_kind()) {
            self.derive("arith_expr", vec!["term".into()]);
        }
        left
    }

    /// `term -> factor (mult_op factor)*`, folded the same way as `arith_expr`.
    fn parse_term(&mut self) -> NodeId {
        let mut left = self.parse_factor();
        while MULT_OPS.contains(&self.current_kind()) {
            let op = self.advance();
            let right = self.parse_factor();
            self.derive("term", vec!["term".into(), format!("{}", op.kind), "factor".into()]);
            left = self.group_with_token(NodeKind::MultExpr, Some(op), vec![left, right]);
        }
        if !MULT_OPS.contains(&self.current_kind()) {
            self.derive("term", vec!["factor".into()]);
        }
        left
    }

    /// `factor -> int_lit | float_lit | '(' expr ')' | 'not' factor |
    /// sign factor | var_or_call`
    fn parse_factor(&mut self) -> NodeId {
        if !self.sync("factor", FIRST_FACTOR, &[], false) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        match self.current_kind() {
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral => {
                let tok = self.advance();
                self.derive("factor", vec!["literal".into()]);
                self.leaf(NodeKind::Literal, Some(tok))
            }
            TokenKind::OpenPar => {
                self.advance();
                let expr = self.parse_expr();
                self.expect(TokenKind::ClosePar);
                self.derive("factor", vec!["(".into(), "expr".into(), ")".into()]);
                expr
            }
            TokenKind::Not => {
                let tok = self.advance();
                let inner = self.parse_factor();
                self.derive("factor", vec!["not".into(), "factor".into()]);
                self.group_with_token(NodeKind::Not, Some(tok), vec![inner])
            }
            TokenKind::Plus | TokenKind::Minus => {
                let tok = self.advance();
                let inner = self.parse_factor();
                self.derive("factor", vec!["sign".into(), "factor".into()]);
                self.group_with_token(NodeKind::Sign, Some(tok), vec![inner])
            }
            TokenKind::Id => {
                let segments = self.parse_chain_segments();
                self.derive("factor", vec!["var".into()]);
                self.list(NodeKind::Var, segments)
            }
            _ => self.leaf(NodeKind::Epsilon, None),
        }
    }

    /// The shared left-factored prefix `id ( [args] | [indices] ) ( .id … )*`
    /// (§4.2 "Variable/call chains"). Returns the chain's segments in source
    /// order, each either a `DATA_MEMBER` (`id` + `index_list`) or an
    /// `F_CALL` (`id` + `arg_list`); callers decide what the final segment
    /// must be.
    pub(crate) fn parse_chain_segments(&mut self) -> Vec<NodeId> {
        let mut segments = Vec::new();
        loop {
            let name = self.expect(TokenKind::Id);
            let name_id = self.leaf(NodeKind::Id, name);
            if self.at(TokenKind::OpenPar) {
                self.advance();
                let args = self.parse_arg_list();
                self.expect(TokenKind::ClosePar);
                self.derive("f_call", vec!["id".into(), "(".into(), "arg_list".into(), ")".into()]);
                segments.push(self.group(NodeKind::FCall, vec![name_id, args]));
            } else {
                let indices = self.parse_index_list();
                self.derive("data_member", vec!["id".into(), "index_list".into()]);
                segments.push(self.group(NodeKind::DataMember, vec![name_id, indices]));
            }
            if self.at(TokenKind::Dot) {
                self.advance();
                continue;
            }
            break;
        }
        segments
    }

    /// `index_list -> ('[' expr ']')*`
    fn parse_index_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        while self.at(TokenKind::OpenSbr) {
            self.advance();
            children.push(self.parse_expr());
            self.expect(TokenKind::CloseSbr);
        }
        if children.is_empty() {
            self.derive_epsilon("index_list");
        } else {
            self.derive("index_list", vec!["[".into(), "expr".into(), "]".into(), "index_list".into()]);
        }
        self.list(NodeKind::IndexList, children)
    }

    /// `arg_list -> (expr (',' expr)*)?`
    fn parse_arg_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        if FIRST_FACTOR.contains(&self.current_kind()) {
            children.push(self.parse_expr());
            while self.at(TokenKind::Comma) {
                self.advance();
                children.push(self.parse_expr());
            }
        }
        if children.is_empty() {
            self.derive_epsilon("arg_list");
        } else {
            self.derive("arg_list", vec!["expr".into(), "arg_list_tail".into()]);
        }
        self.list(NodeKind::ArgList, children)
    }
}
