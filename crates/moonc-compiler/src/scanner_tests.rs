use crate::scanner::Scanner;
use crate::token::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    Scanner::tokenize(source).into_iter().map(|t| t.kind).collect()
}

fn lexemes(source: &str) -> Vec<String> {
    Scanner::tokenize(source).into_iter().map(|t| t.lexeme).collect()
}

#[test]
fn accepts_plain_integers_and_floats() {
    assert_eq!(kinds("0"), vec![TokenKind::IntegerLiteral, TokenKind::Eof]);
    assert_eq!(kinds("0.0"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
    assert_eq!(kinds("12.34e-2"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
}

#[test]
fn rejects_leading_zero_integers() {
    assert_eq!(kinds("00"), vec![TokenKind::InvalidNumber, TokenKind::Eof]);
}

#[test]
fn rejects_dangling_dot() {
    let toks = Scanner::tokenize("1.");
    assert_eq!(toks[0].kind, TokenKind::InvalidNumber);
}

#[test]
fn rejects_trailing_zero_floats() {
    assert_eq!(kinds("0.10"), vec![TokenKind::InvalidNumber, TokenKind::Eof]);
}

#[test]
fn rejects_leading_zero_exponent() {
    assert_eq!(kinds("0.1e01"), vec![TokenKind::InvalidNumber, TokenKind::Eof]);
}

#[test]
fn upgrades_to_invalid_identifier_on_letters() {
    assert_eq!(kinds("1abc"), vec![TokenKind::InvalidIdentifier, TokenKind::Eof]);
}

#[test]
fn splits_number_minus_number_from_bad_exponent() {
    // 0.10e-01 -> invalid_number("0.10e"), minus, invalid_number("01")
    let toks = Scanner::tokenize("0.10e-01");
    let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::InvalidNumber,
            TokenKind::Minus,
            TokenKind::InvalidNumber,
            TokenKind::Eof
        ]
    );
    assert_eq!(toks[0].lexeme, "0.10e");
    assert_eq!(toks[2].lexeme, "01");
}

#[test]
fn dot_id_suffix_does_not_consume_the_dot() {
    let lex = lexemes("100.id");
    assert_eq!(lex, vec!["100", ".", "id", ""]);
    let ks = kinds("100.id");
    assert_eq!(
        ks,
        vec![TokenKind::IntegerLiteral, TokenKind::Dot, TokenKind::Id, TokenKind::Eof]
    );
}

#[test]
fn two_char_operators() {
    assert_eq!(kinds("=="), vec![TokenKind::Eq, TokenKind::Eof]);
    assert_eq!(kinds("<>"), vec![TokenKind::NeqLex, TokenKind::Eof]);
    assert_eq!(kinds("<="), vec![TokenKind::Lte, TokenKind::Eof]);
    assert_eq!(kinds(">="), vec![TokenKind::Gte, TokenKind::Eof]);
    assert_eq!(kinds("::"), vec![TokenKind::DColon, TokenKind::Eof]);
}

#[test]
fn lone_first_char_of_a_two_char_symbol_backtracks_cleanly() {
    assert_eq!(kinds("<a"), vec![TokenKind::Lt, TokenKind::Id, TokenKind::Eof]);
    assert_eq!(kinds("=a"), vec![TokenKind::Assign, TokenKind::Id, TokenKind::Eof]);
}

#[test]
fn keywords_retype_identifiers() {
    assert_eq!(kinds("class"), vec![TokenKind::Class, TokenKind::Eof]);
    assert_eq!(kinds("and"), vec![TokenKind::And, TokenKind::Eof]);
    assert_eq!(kinds("classFoo"), vec![TokenKind::Id, TokenKind::Eof]);
}

#[test]
fn inline_comment_runs_to_newline() {
    let toks = Scanner::tokenize("// hi\nx");
    assert_eq!(toks[0].kind, TokenKind::InlineComment);
    assert_eq!(toks[1].kind, TokenKind::Id);
}

#[test]
fn block_comment_spans_lines() {
    let toks = Scanner::tokenize("/* a\nb */x");
    assert_eq!(toks[0].kind, TokenKind::BlockComment);
    assert_eq!(toks[1].kind, TokenKind::Id);
}

#[test]
fn unterminated_block_comment_is_dangling() {
    let toks = Scanner::tokenize("/* never closes");
    assert_eq!(toks[0].kind, TokenKind::DanglingBlockComment);
    assert_eq!(toks[1].kind, TokenKind::Eof);
}

#[test]
fn invalid_character_is_reported_with_empty_lexeme() {
    let toks = Scanner::tokenize("@");
    assert_eq!(toks[0].kind, TokenKind::InvalidCharacter);
    assert_eq!(toks[0].lexeme, "");
}

#[test]
fn leading_underscore_is_invalid_identifier() {
    let toks = Scanner::tokenize("_foo");
    assert_eq!(toks[0].kind, TokenKind::InvalidIdentifier);
}

#[test]
fn tracks_line_and_column() {
    let toks = Scanner::tokenize("a\n  b");
    assert_eq!(toks[0].location.line, 1);
    assert_eq!(toks[0].location.column, 1);
    assert_eq!(toks[1].location.line, 2);
    assert_eq!(toks[1].location.column, 3);
}
