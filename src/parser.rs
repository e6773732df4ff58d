//! Command-line tokenization.
//!
//! Splits one line into an argument vector. Single-quoted spans form a
//! single argument with the quotes stripped; a trailing standalone `&`
//! marks a background request and is removed from argv. Tokenization is
//! total: an unterminated quote silently ends the scan, the way the
//! original scanner dropped the dangling span.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

/// One tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub argv: Vec<String>,
    pub background: bool,
}

/// Parse a single-quoted span: the whole span is one argument.
fn single_quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| s.to_string(),
    )(input)
}

/// Parse a bare word up to whitespace or a quote.
fn bare_word(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !c.is_whitespace() && c != '\''),
        |s: &str| s.to_string(),
    )(input)
}

fn token(input: &str) -> IResult<&str, String> {
    alt((single_quoted, bare_word))(input)
}

/// Tokenize one command line into argv plus the background flag.
pub fn parse_line(line: &str) -> CommandLine {
    let mut argv = match many0(preceded(multispace0, token))(line.trim()) {
        Ok((_, argv)) => argv,
        Err(_) => Vec::new(),
    };
    let background = argv.last().map(String::as_str) == Some("&");
    if background {
        argv.pop();
    }
    CommandLine { argv, background }
}
