//! Hand-written lexical scanner: a dispatcher over three sub-DFAs
//! (numerical, symbol, word) sharing scanner state, plus a whitespace
//! skipper and an error trap.
//!
//! Each sub-automaton is represented as a `State` variant; `step` is the
//! single `(state, char) -> Action` function the whole scanner runs
//! through, rather than a family of per-state closures.

use moonc_core::Location;

use crate::token::{lookup_keyword, Token, TokenKind};

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
fn is_nonzero_digit(c: char) -> bool {
    c.is_ascii_digit() && c != '0'
}
fn is_alphanum(c: char) -> bool {
    is_letter(c) || is_digit(c) || c == '_'
}
fn is_single_symbol(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | ';' | '.' | ',' | '(' | ')' | '{' | '}' | '[' | ']')
}
fn is_dual_symbol(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '/' | ':')
}
fn is_symbol_start(c: char) -> bool {
    is_single_symbol(c) || is_dual_symbol(c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dfa {
    Numerical(NumState),
    Symbol(SymState),
    Word(WordState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumState {
    Start,
    Zero,
    Integer,
    Point,
    ValidFloat,
    Float,
    Exponent,
    Signed,
    Digit,
    EZero,
    Trap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymState {
    First,
    /// The single pending two-char symbol this dispatch could still become
    /// (`Eq` for `=`, `NeqLex`/`Lte`/`Lt` for `<`, etc). `None` means "no
    /// second-char match", producing the lone first-char token instead.
    Dual(char),
    InlineComment,
    BlockComment,
    BlockStar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordState {
    First,
    Identifier,
    Trap,
}

/// Outcome of feeding one character to the active sub-DFA.
enum Action {
    /// Append `char` to the lexeme, move to `next`.
    Transition(char, Dfa),
    /// Append `char` to the lexeme, stay in the same state.
    Repeat(char),
    /// Re-feed `char` to `next` without consuming it as part of this token.
    Forward(char, Dfa),
    /// Emit the accumulated token; optionally push `char` back for the next
    /// token's first character.
    Success(Option<char>),
}

pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    token_line: u32,
    token_column: u32,
    lexeme: String,
    kind: Option<TokenKind>,
    dfa: Option<Dfa>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
            lexeme: String::new(),
            kind: None,
            dfa: None,
        }
    }

    /// Scans the whole source into a finite token sequence ending in `Eof`.
    /// Comments are kept (callers filter them for the parser, per the data
    /// model's "comments are filtered out of the parser's input stream").
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_raw(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_raw()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Push a single character back so the next call sees it again. Column
    /// bookkeeping assumes backtrack never crosses a newline, true for
    /// every call site below (lookahead characters are always digits,
    /// letters, or symbols).
    fn push_back(&mut self, c: char) {
        self.pos -= 1;
        self.column -= 1;
        debug_assert_eq!(self.chars[self.pos], c);
    }

    fn reset(&mut self) {
        self.lexeme.clear();
        self.kind = None;
        self.dfa = None;
    }

    pub fn next_token(&mut self) -> Token {
        self.reset();
        let mut pending = self.bump();

        loop {
            let Some(c) = pending.take() else {
                if matches!(
                    self.dfa,
                    Some(Dfa::Symbol(SymState::BlockComment)) | Some(Dfa::Symbol(SymState::BlockStar))
                ) {
                    return self.finish(TokenKind::DanglingBlockComment);
                }
                // A token still in progress when the character stream runs
                // out (e.g. a source with no trailing newline) must still
                // be emitted before the final `Eof`: there is no further
                // character to dispatch on, so resolve it as if whitespace
                // had followed.
                if let Some(dfa) = self.dfa {
                    self.step_eof(dfa);
                    let kind = self.kind.unwrap_or(TokenKind::InvalidCharacter);
                    return self.finish(kind);
                }
                self.token_line = self.line;
                self.token_column = self.column;
                return self.finish(TokenKind::Eof);
            };

            let Some(dfa) = self.dfa else {
                if c.is_whitespace() {
                    pending = self.bump();
                    continue;
                }
                self.token_line = self.line;
                self.token_column = self.column - 1;
                match self.dispatch(c) {
                    Some(dfa) => {
                        self.dfa = Some(dfa);
                        pending = Some(c);
                    }
                    None => {
                        // Consumed, not part of any lexeme: an unrecognized
                        // character is its own zero-width error token.
                        return self.finish(TokenKind::InvalidCharacter);
                    }
                }
                continue;
            };

            match self.step(dfa, c) {
                Action::Transition(ch, next) => {
                    self.lexeme.push(ch);
                    self.dfa = Some(next);
                    pending = self.bump();
                }
                Action::Repeat(ch) => {
                    self.lexeme.push(ch);
                    pending = self.bump();
                }
                Action::Forward(ch, next) => {
                    self.dfa = Some(next);
                    pending = Some(ch);
                }
                Action::Success(backtrack) => {
                    if let Some(ch) = backtrack {
                        self.push_back(ch);
                    }
                    let kind = self.kind.unwrap_or(TokenKind::InvalidCharacter);
                    return self.finish(kind);
                }
            }
        }
    }

    fn finish(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme.clone(), Location::new(self.token_line, self.token_column))
    }

    fn dispatch(&mut self, c: char) -> Option<Dfa> {
        if is_digit(c) {
            Some(Dfa::Numerical(NumState::Start))
        } else if is_letter(c) || c == '_' {
            Some(Dfa::Word(WordState::First))
        } else if is_symbol_start(c) {
            Some(Dfa::Symbol(SymState::First))
        } else {
            None
        }
    }

    /// Rewinds the cursor `n` characters, for the `.id` lookahead fix-up.
    /// Never crosses a newline at any call site, so a flat column
    /// decrement is exact.
    fn rewind(&mut self, n: u32) {
        self.pos -= n as usize;
        self.column -= n;
    }

    /// Resolves whatever token is in progress when the character stream
    /// ends, matching each state's "anything else" transition but with no
    /// trailing character to push back.
    fn step_eof(&mut self, dfa: Dfa) {
        match dfa {
            Dfa::Numerical(state) => match state {
                NumState::Point => {
                    // `5.` at true end-of-input: there is no lookahead
                    // character left that could be an identifier start, so
                    // this is always a dangling dot, never the `100.id`
                    // fix-up case.
                    self.kind = Some(TokenKind::InvalidNumber);
                }
                NumState::Float | NumState::Exponent | NumState::Signed => {
                    self.kind = Some(TokenKind::InvalidNumber);
                }
                NumState::Start | NumState::Zero | NumState::Integer | NumState::ValidFloat
                | NumState::Digit | NumState::EZero | NumState::Trap => {}
            },
            Dfa::Symbol(state) => match state {
                SymState::Dual(first) => {
                    self.kind = Some(dual_symbol_first_kind(first));
                }
                SymState::First | SymState::InlineComment | SymState::BlockComment | SymState::BlockStar => {}
            },
            Dfa::Word(state) => match state {
                WordState::Identifier => {
                    self.kind = Some(lookup_keyword(&self.lexeme).unwrap_or(TokenKind::Id));
                }
                WordState::First | WordState::Trap => {}
            },
        }
    }

    fn step(&mut self, dfa: Dfa, c: char) -> Action {
        match dfa {
            Dfa::Numerical(s) => self.step_numerical(s, c),
            Dfa::Symbol(s) => self.step_symbol(s, c),
            Dfa::Word(s) => self.step_word(s, c),
        }
    }

    fn step_numerical(&mut self, state: NumState, c: char) -> Action {
        use NumState::*;
        match state {
            Start => {
                self.kind = Some(TokenKind::IntegerLiteral);
                if c == '0' {
                    Action::Transition(c, Dfa::Numerical(Zero))
                } else if is_nonzero_digit(c) {
                    Action::Transition(c, Dfa::Numerical(Integer))
                } else {
                    unreachable!("dispatch only enters Numerical on a digit")
                }
            }
            Zero => {
                if c == '.' {
                    Action::Transition(c, Dfa::Numerical(Point))
                } else if is_digit(c) {
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Transition(c, Dfa::Numerical(Trap))
                } else {
                    Action::Success(Some(c))
                }
            }
            Integer => {
                if c == '.' {
                    Action::Transition(c, Dfa::Numerical(Point))
                } else if is_digit(c) {
                    Action::Repeat(c)
                } else {
                    Action::Success(Some(c))
                }
            }
            Point => {
                if is_digit(c) {
                    self.kind = Some(TokenKind::FloatLiteral);
                    Action::Transition(c, Dfa::Numerical(ValidFloat))
                } else if is_letter(c) || c == '_' {
                    // The dot wasn't part of a float after all (`100.id`):
                    // un-consume it and `c`, and let the integer stand on
                    // its own.
                    self.lexeme.pop();
                    self.rewind(2);
                    Action::Success(None)
                } else {
                    // A dot followed by anything else (`1.`, `1. `, `1.;`)
                    // is a dangling dot, not a lookahead fix-up: trap it.
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Forward(c, Dfa::Numerical(Trap))
                }
            }
            ValidFloat => {
                if c == 'e' {
                    Action::Transition(c, Dfa::Numerical(Exponent))
                } else if c == '0' {
                    Action::Transition(c, Dfa::Numerical(Float))
                } else if is_nonzero_digit(c) {
                    Action::Repeat(c)
                } else {
                    Action::Success(Some(c))
                }
            }
            Float => {
                if c == '0' {
                    Action::Repeat(c)
                } else if is_nonzero_digit(c) {
                    Action::Transition(c, Dfa::Numerical(ValidFloat))
                } else {
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Forward(c, Dfa::Numerical(Trap))
                }
            }
            Exponent => {
                if c == '+' || c == '-' {
                    Action::Transition(c, Dfa::Numerical(Signed))
                } else if is_nonzero_digit(c) {
                    Action::Transition(c, Dfa::Numerical(Digit))
                } else if c == '0' {
                    Action::Transition(c, Dfa::Numerical(EZero))
                } else {
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Forward(c, Dfa::Numerical(Trap))
                }
            }
            Signed => {
                if is_nonzero_digit(c) {
                    Action::Transition(c, Dfa::Numerical(Digit))
                } else if c == '0' {
                    Action::Transition(c, Dfa::Numerical(EZero))
                } else {
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Forward(c, Dfa::Numerical(Trap))
                }
            }
            Digit => {
                if is_digit(c) {
                    Action::Repeat(c)
                } else {
                    Action::Success(Some(c))
                }
            }
            EZero => {
                if is_digit(c) {
                    self.kind = Some(TokenKind::InvalidNumber);
                    Action::Transition(c, Dfa::Numerical(Trap))
                } else {
                    Action::Success(Some(c))
                }
            }
            Trap => {
                if is_alphanum(c) {
                    if (is_letter(c) && c != 'e') || c == '_' {
                        self.kind = Some(TokenKind::InvalidIdentifier);
                    }
                    Action::Repeat(c)
                } else {
                    Action::Success(Some(c))
                }
            }
        }
    }

    fn step_symbol(&mut self, state: SymState, c: char) -> Action {
        use SymState::*;
        match state {
            First => {
                if is_single_symbol(c) {
                    self.kind = Some(single_symbol_kind(c));
                    self.lexeme.push(c);
                    Action::Success(None)
                } else if is_dual_symbol(c) {
                    Action::Transition(c, Dfa::Symbol(Dual(c)))
                } else {
                    unreachable!("dispatch only enters Symbol on a symbol char")
                }
            }
            Dual(first) => match dual_symbol_kind(first, c) {
                Some(TokenKind::InlineComment) => {
                    self.kind = Some(TokenKind::InlineComment);
                    Action::Transition(c, Dfa::Symbol(InlineComment))
                }
                Some(TokenKind::BlockComment) => {
                    self.kind = Some(TokenKind::BlockComment);
                    Action::Transition(c, Dfa::Symbol(BlockComment))
                }
                Some(kind) => {
                    self.kind = Some(kind);
                    self.lexeme.push(c);
                    Action::Success(None)
                }
                None => {
                    self.kind = Some(dual_symbol_first_kind(first));
                    Action::Success(Some(c))
                }
            },
            InlineComment => {
                if c == '\n' {
                    Action::Success(Some(c))
                } else {
                    Action::Repeat(c)
                }
            }
            BlockComment => {
                if c == '*' {
                    Action::Transition(c, Dfa::Symbol(BlockStar))
                } else {
                    Action::Repeat(c)
                }
            }
            BlockStar => {
                if c == '/' {
                    self.lexeme.push(c);
                    Action::Success(None)
                } else if c == '*' {
                    Action::Repeat(c)
                } else {
                    Action::Transition(c, Dfa::Symbol(BlockComment))
                }
            }
        }
    }

    fn step_word(&mut self, state: WordState, c: char) -> Action {
        use WordState::*;
        match state {
            First => {
                if is_letter(c) {
                    Action::Transition(c, Dfa::Word(Identifier))
                } else if is_alphanum(c) {
                    self.kind = Some(TokenKind::InvalidIdentifier);
                    Action::Transition(c, Dfa::Word(Trap))
                } else {
                    unreachable!("dispatch only enters Word on a letter/underscore")
                }
            }
            Identifier => {
                if is_alphanum(c) {
                    Action::Repeat(c)
                } else {
                    self.kind = Some(lookup_keyword(&self.lexeme).unwrap_or(TokenKind::Id));
                    Action::Success(Some(c))
                }
            }
            Trap => {
                if is_alphanum(c) {
                    Action::Repeat(c)
                } else {
                    Action::Success(Some(c))
                }
            }
        }
    }
}

fn single_symbol_kind(c: char) -> TokenKind {
    match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Mult,
        ';' => TokenKind::SemiColon,
        '.' => TokenKind::Dot,
        ',' => TokenKind::Comma,
        '(' => TokenKind::OpenPar,
        ')' => TokenKind::ClosePar,
        '{' => TokenKind::OpenCbr,
        '}' => TokenKind::CloseCbr,
        '[' => TokenKind::OpenSbr,
        ']' => TokenKind::CloseSbr,
        _ => unreachable!(),
    }
}

/// The lone token a dual-symbol starter (`= < > / :`) resolves to when its
/// second character doesn't complete a two-char symbol.
fn dual_symbol_first_kind(c: char) -> TokenKind {
    match c {
        '=' => TokenKind::Assign,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '/' => TokenKind::Div,
        ':' => TokenKind::Colon,
        _ => unreachable!(),
    }
}

fn dual_symbol_kind(first: char, second: char) -> Option<TokenKind> {
    Some(match (first, second) {
        ('=', '=') => TokenKind::Eq,
        ('<', '>') => TokenKind::NeqLex,
        ('<', '=') => TokenKind::Lte,
        ('>', '=') => TokenKind::Gte,
        (':', ':') => TokenKind::DColon,
        ('/', '/') => TokenKind::InlineComment,
        ('/', '*') => TokenKind::BlockComment,
        _ => return None,
    })
}
