//! Tokenization for the dsviz console language
//!
//! Tokens represent the atomic elements of console syntax. Newlines are
//! tokens too, because they end statements.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, none_of, space0},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, many0_count},
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Eq,      // ==
    Ne,      // !=
    Le,      // <=
    Ge,      // >=
    Lt,      // <
    Gt,      // >
    And,     // &&
    Or,      // ||
    Not,     // !
    Assign,  // =
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal
    Number(f64),
    /// A quoted string, escapes already resolved
    Str(String),
    /// A name (variable, function, method, or keyword)
    Ident(String),
    /// An operator
    Operator(Operator),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    /// End of a line
    Newline,
}

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Parse a double-quoted string with \" \\ \n \t escapes
fn double_quoted_string(input: &str) -> IResult<&str, Token> {
    let (input, content) = delimited(
        char('"'),
        map(
            opt(escaped_transform(
                none_of("\"\\"),
                '\\',
                alt((
                    value("\\", char('\\')),
                    value("\"", char('"')),
                    value("\n", char('n')),
                    value("\t", char('t')),
                )),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)?;
    Ok((input, Token::Str(content)))
}

/// Parse a single-quoted string (no escapes)
fn single_quoted_string(input: &str) -> IResult<&str, Token> {
    let (input, content) = delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)?;
    Ok((input, Token::Str(content.to_string())))
}

/// Parse an unsigned number: digits with an optional fraction
fn number(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse::<f64>().map(Token::Number),
    )(input)
}

/// Parse an identifier: letter or underscore, then letters, digits, underscores
fn identifier(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| Token::Ident(s.to_string()),
    )(input)
}

/// Parse an operator; two-character forms first
fn operator(input: &str) -> IResult<&str, Token> {
    map(
        alt((
            value(Operator::Eq, tag("==")),
            value(Operator::Ne, tag("!=")),
            value(Operator::Le, tag("<=")),
            value(Operator::Ge, tag(">=")),
            value(Operator::And, tag("&&")),
            value(Operator::Or, tag("||")),
            value(Operator::Plus, char('+')),
            value(Operator::Minus, char('-')),
            value(Operator::Star, char('*')),
            value(Operator::Slash, char('/')),
            value(Operator::Percent, char('%')),
            value(Operator::Lt, char('<')),
            value(Operator::Gt, char('>')),
            value(Operator::Not, char('!')),
            value(Operator::Assign, char('=')),
        )),
        Token::Operator,
    )(input)
}

/// Parse punctuation and line ends
fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::LBrace, char('{')),
        value(Token::RBrace, char('}')),
        value(Token::LBracket, char('[')),
        value(Token::RBracket, char(']')),
        value(Token::Comma, char(',')),
        value(Token::Semicolon, char(';')),
        value(Token::Dot, char('.')),
        value(Token::Newline, alt((tag("\r\n"), tag("\n")))),
    ))(input)
}

/// Parse any single token
fn token(input: &str) -> IResult<&str, Token> {
    preceded(
        space0,
        alt((
            double_quoted_string,
            single_quoted_string,
            number,
            identifier,
            operator,
            punctuation,
        )),
    )(input)
}

/// Strip comments from input (# to end of line, outside strings)
fn strip_comments(input: &str) -> String {
    let mut result = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_double_quote && !escaped => {
                escaped = true;
                result.push(c);
                continue;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                result.push(c);
            }
            '"' if !in_single_quote && !escaped => {
                in_double_quote = !in_double_quote;
                result.push(c);
            }
            '#' if !in_single_quote && !in_double_quote => {
                // Skip to end of line, keeping the newline
                for remaining in chars.by_ref() {
                    if remaining == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
        escaped = false;
    }
    result
}

/// Tokenize a complete input string
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    let input = strip_comments(input);

    let (remaining, tokens) =
        many0(token)(&input).map_err(|e| LexError::ParseError(format!("{:?}", e)))?;

    // Check for any remaining unparsed content
    let remaining = remaining.trim();
    match remaining.chars().next() {
        None => Ok(tokens),
        Some('"') | Some('\'') => Err(LexError::UnterminatedString),
        Some(c) => Err(LexError::UnexpectedChar(c)),
    }
}
