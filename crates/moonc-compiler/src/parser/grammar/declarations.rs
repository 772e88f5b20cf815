//! `prog`, class declarations, member declarations, and function
//! declarations/definitions — everything above statement level.

use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

use super::super::Parser;
use super::FIRST_TYPE;

impl<'a> Parser<'a> {
    /// `prog -> class_list func_list 'main' main_body`
    pub(crate) fn parse_prog(&mut self) -> Option<NodeId> {
        let class_list = self.parse_class_list();
        let func_list = self.parse_func_list();
        if !self.at(TokenKind::Main) {
            self.diagnostics.error(
                self.location(),
                format!("Syntax error: expected 'main' but found '{}'", self.current().lexeme),
            );
            self.failed = true;
            return None;
        }
        self.advance();
        let main_body = self.parse_main_body();
        self.derive(
            "prog",
            vec!["class_list".into(), "func_list".into(), "main".into(), "main_body".into()],
        );
        Some(self.group(NodeKind::Prog, vec![class_list, func_list, main_body]))
    }

    /// `class_list -> class_decl*`
    pub(crate) fn parse_class_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        while self.at(TokenKind::Class) {
            children.push(self.parse_class_decl());
        }
        if children.is_empty() {
            self.derive_epsilon("class_list");
        } else {
            self.derive("class_list", vec!["class_decl".into(), "class_list".into()]);
        }
        self.list(NodeKind::ClassList, children)
    }

    /// `class_decl -> 'class' id inher_list '{' member_list '}' ';'`
    pub(crate) fn parse_class_decl(&mut self) -> NodeId {
        if !self.sync("class_decl", &[TokenKind::Class], &[TokenKind::Main, TokenKind::Class], true) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        self.advance();
        let name = self.expect(TokenKind::Id);
        let name_id = self.leaf(NodeKind::Id, name);
        let inher = self.parse_inher_list();
        self.expect(TokenKind::OpenCbr);
        let members = self.parse_member_list();
        self.expect(TokenKind::CloseCbr);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "class_decl",
            vec![
                "class".into(),
                "id".into(),
                "inher_list".into(),
                "{".into(),
                "member_list".into(),
                "}".into(),
                ";".into(),
            ],
        );
        self.group(NodeKind::ClassDecl, vec![name_id, inher, members])
    }

    /// `inher_list -> 'inherits' id (',' id)* | epsilon`
    fn parse_inher_list(&mut self) -> NodeId {
        if !self.at(TokenKind::Inherits) {
            self.derive_epsilon("inher_list");
            return self.list(NodeKind::InherList, Vec::new());
        }
        self.advance();
        let mut children = Vec::new();
        let first = self.expect(TokenKind::Id);
        children.push(self.leaf(NodeKind::Id, first));
        while self.at(TokenKind::Comma) {
            self.advance();
            let tok = self.expect(TokenKind::Id);
            children.push(self.leaf(NodeKind::Id, tok));
        }
        self.derive("inher_list", vec!["inherits".into(), "id_list".into()]);
        self.list(NodeKind::InherList, children)
    }

    /// `member_list -> member_decl*`
    fn parse_member_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        let first_member = [
            TokenKind::Public,
            TokenKind::Private,
            TokenKind::Integer,
            TokenKind::Float,
            TokenKind::Id,
        ];
        while first_member.contains(&self.current_kind()) {
            children.push(self.parse_member_decl());
        }
        if children.is_empty() {
            self.derive_epsilon("member_list");
        } else {
            self.derive("member_list", vec!["member_decl".into(), "member_list".into()]);
        }
        self.list(NodeKind::MemberList, children)
    }

    /// `member_decl -> visibility (func_decl | var_decl)`
    fn parse_member_decl(&mut self) -> NodeId {
        let first = [
            TokenKind::Public,
            TokenKind::Private,
            TokenKind::Integer,
            TokenKind::Float,
            TokenKind::Id,
        ];
        if !self.sync("member_decl", &first, &[TokenKind::CloseCbr], true) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        let visibility = self.parse_visibility();
        let inner = if self.at(TokenKind::Id) && self.peek_kind(1) == TokenKind::OpenPar {
            self.parse_func_decl()
        } else {
            self.parse_var_decl()
        };
        self.derive("member_decl", vec!["visibility".into(), "member".into()]);
        self.group(NodeKind::MemberDecl, vec![visibility, inner])
    }

    /// `visibility -> 'public' | 'private' | epsilon`
    fn parse_visibility(&mut self) -> NodeId {
        if self.at(TokenKind::Public) || self.at(TokenKind::Private) {
            let tok = self.advance();
            self.derive("visibility", vec![format!("{}", tok.kind)]);
            self.leaf(NodeKind::Visibility, Some(tok))
        } else {
            self.derive_epsilon("visibility");
            self.leaf(NodeKind::Epsilon, None)
        }
    }

    /// `func_decl -> id '(' param_list ')' (':' type)? ';'`
    fn parse_func_decl(&mut self) -> NodeId {
        let name = self.expect(TokenKind::Id);
        let name_id = self.leaf(NodeKind::Id, name);
        self.expect(TokenKind::OpenPar);
        let params = self.parse_param_list();
        self.expect(TokenKind::ClosePar);
        let ret = self.parse_optional_return_type();
        self.expect(TokenKind::SemiColon);
        self.derive(
            "func_decl",
            vec![
                "id".into(),
                "(".into(),
                "param_list".into(),
                ")".into(),
                "return_type".into(),
                ";".into(),
            ],
        );
        self.group(NodeKind::FuncDecl, vec![name_id, params, ret])
    }

    /// `var_decl -> type id dim_list ';'`
    pub(crate) fn parse_var_decl(&mut self) -> NodeId {
        if !self.sync(
            "var_decl",
            FIRST_TYPE,
            &[TokenKind::CloseCbr, TokenKind::SemiColon],
            true,
        ) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        let ty = self.parse_type();
        let name = self.expect(TokenKind::Id);
        let name_id = self.leaf(NodeKind::Id, name);
        let dims = self.parse_dim_list(true);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "var_decl",
            vec!["type".into(), "id".into(), "dim_list".into(), ";".into()],
        );
        self.group(NodeKind::VarDecl, vec![ty, name_id, dims])
    }

    /// `type -> 'integer' | 'float' | id`
    pub(crate) fn parse_type(&mut self) -> NodeId {
        let tok = if self.at(TokenKind::Integer) || self.at(TokenKind::Float) || self.at(TokenKind::Id) {
            self.advance()
        } else {
            self.expect(TokenKind::Id).unwrap_or_else(|| {
                crate::token::Token::new(TokenKind::Id, "", self.location())
            })
        };
        self.derive("type", vec![format!("{}", tok.kind)]);
        self.leaf(NodeKind::Type, Some(tok))
    }

    /// `dim_list -> ('[' literal? ']')*`. Declarations carry a literal
    /// size; parameter dims never do (unspecified size per the spec's
    /// `SymbolType` model).
    pub(crate) fn parse_dim_list(&mut self, allow_literal: bool) -> NodeId {
        let mut children = Vec::new();
        while self.at(TokenKind::OpenSbr) {
            self.advance();
            if allow_literal && self.at(TokenKind::IntegerLiteral) {
                let tok = self.advance();
                children.push(self.leaf(NodeKind::Literal, Some(tok)));
            } else {
                children.push(self.leaf(NodeKind::Epsilon, None));
            }
            self.expect(TokenKind::CloseSbr);
        }
        if children.is_empty() {
            self.derive_epsilon("dim_list");
        } else {
            self.derive("dim_list", vec!["[".into(), "dim".into(), "]".into(), "dim_list".into()]);
        }
        self.list(NodeKind::DimList, children)
    }

    /// `param_list -> (func_param (',' func_param)*)?`
    fn parse_param_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        if FIRST_TYPE.contains(&self.current_kind()) {
            children.push(self.parse_func_param());
            while self.at(TokenKind::Comma) {
                self.advance();
                children.push(self.parse_func_param());
            }
        }
        if children.is_empty() {
            self.derive_epsilon("param_list");
        } else {
            self.derive("param_list", vec!["func_param".into(), "param_list_tail".into()]);
        }
        self.list(NodeKind::ParamList, children)
    }

    /// `func_param -> id ':' type dim_list`
    fn parse_func_param(&mut self) -> NodeId {
        let name = self.expect(TokenKind::Id);
        let name_id = self.leaf(NodeKind::Id, name);
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let dims = self.parse_dim_list(false);
        self.derive(
            "func_param",
            vec!["id".into(), ":".into(), "type".into(), "dim_list".into()],
        );
        self.group(NodeKind::FuncParam, vec![name_id, ty, dims])
    }

    fn parse_optional_return_type(&mut self) -> NodeId {
        if self.at(TokenKind::Colon) {
            self.advance();
            self.parse_type()
        } else {
            self.leaf(NodeKind::Epsilon, None)
        }
    }

    /// `func_list -> func_def*`
    pub(crate) fn parse_func_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        while self.at(TokenKind::Id) {
            children.push(self.parse_func_def());
        }
        if children.is_empty() {
            self.derive_epsilon("func_list");
        } else {
            self.derive("func_list", vec!["func_def".into(), "func_list".into()]);
        }
        self.list(NodeKind::FuncList, children)
    }

    /// `func_def -> (id '::')? id '(' param_list ')' (':' type)? func_body`
    pub(crate) fn parse_func_def(&mut self) -> NodeId {
        if !self.sync("func_def", &[TokenKind::Id], &[TokenKind::Main], true) {
            return self.leaf(NodeKind::Epsilon, None);
        }
        let first = self.advance();
        let (scope, name) = if self.at(TokenKind::DColon) {
            self.advance();
            let method = self.expect(TokenKind::Id);
            (
                Some(self.leaf(NodeKind::ScopeSpec, Some(first))),
                self.leaf(NodeKind::Id, method),
            )
        } else {
            (None, self.leaf(NodeKind::Id, Some(first)))
        };
        let scope = scope.unwrap_or_else(|| self.leaf(NodeKind::Epsilon, None));
        self.expect(TokenKind::OpenPar);
        let params = self.parse_param_list();
        self.expect(TokenKind::ClosePar);
        let ret = self.parse_optional_return_type();
        self.expect(TokenKind::OpenCbr);
        let locals = self.parse_local_list();
        let stats = self.parse_stat_block();
        self.expect(TokenKind::CloseCbr);
        self.expect(TokenKind::SemiColon);
        self.derive(
            "func_def",
            vec![
                "scope_spec".into(),
                "id".into(),
                "(".into(),
                "param_list".into(),
                ")".into(),
                "return_type".into(),
                "{".into(),
                "local_list".into(),
                "stat_block".into(),
                "}".into(),
                ";".into(),
            ],
        );
        self.group(NodeKind::FuncDef, vec![scope, name, params, ret, locals, stats])
    }

    /// `main_body -> 'do' local_list stat_block 'end'`
    fn parse_main_body(&mut self) -> NodeId {
        self.expect(TokenKind::Do);
        let locals = self.parse_local_list();
        let stats = self.parse_stat_block();
        self.expect(TokenKind::End);
        self.derive(
            "main_body",
            vec!["do".into(), "local_list".into(), "stat_block".into(), "end".into()],
        );
        self.group(NodeKind::Main, vec![locals, stats])
    }

    /// `local_list -> var_decl*`, disambiguated from `stat_block` by a
    /// one-token lookahead past a leading `Id`: `type id` (two
    /// identifiers in a row, the second being the declared name) starts
    /// a declaration, anything else starts a statement.
    fn parse_local_list(&mut self) -> NodeId {
        let mut children = Vec::new();
        loop {
            let starts_decl = match self.current_kind() {
                TokenKind::Integer | TokenKind::Float => true,
                TokenKind::Id => self.peek_kind(1) == TokenKind::Id,
                _ => false,
            };
            if !starts_decl {
                break;
            }
            children.push(self.parse_var_decl());
        }
        if children.is_empty() {
            self.derive_epsilon("local_list");
        } else {
            self.derive("local_list", vec!["var_decl".into(), "local_list".into()]);
        }
        self.list(NodeKind::LocalList, children)
    }
}
