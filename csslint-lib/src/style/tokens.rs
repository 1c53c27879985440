//! Token-level helpers on top of cssparser.
//!
//! LightningCSS hands most rules over as typed values. These helpers cover the
//! few places where only text is available: the source prelude it drops, and
//! the printed form of rules whose prelude or body has no public typed field.

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::error::{Error, Result};

type CssParseError<'i> = ParseError<'i, ()>;

/// Name, prelude and raw block contents of one printed at-rule.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct AtRuleParts<'i> {
    pub name: String,
    pub prelude: &'i str,
    /// `None` for statement at-rules ending in `;`.
    pub block: Option<&'i str>,
}

/// Splits a single at-rule into its parts.
///
/// # Arguments
///
/// * `css` - Text starting with an at-keyword, e.g. `@import "a.css" screen;`.
///
/// # Returns
///
/// The at-rule parts, or a parse error when `css` does not start with an
/// at-keyword or its block is never closed.
pub(super) fn at_rule_parts(css: &str) -> Result<AtRuleParts<'_>> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let name = match parser.next() {
        Ok(Token::AtKeyword(name)) => name.to_string(),
        _ => {
            return Err(Error::Parse(format!(
                "expected an at-rule, found `{}`",
                css.trim()
            )))
        }
    };

    let start = parser.position();
    loop {
        let end = parser.position();
        match parser.next() {
            Ok(Token::CurlyBracketBlock) => {
                let block = parser
                    .parse_nested_block(|body| {
                        let inner = body.position();
                        while body.next().is_ok() {}
                        Ok::<_, CssParseError>(body.slice_from(inner))
                    })
                    .map_err(|_| Error::Parse(format!("unterminated block in `@{}`", name)))?;
                return Ok(AtRuleParts {
                    prelude: parser.slice(start..end).trim(),
                    block: Some(block),
                    name,
                });
            }
            Ok(Token::Semicolon) | Err(_) => {
                return Ok(AtRuleParts {
                    prelude: parser.slice(start..end).trim(),
                    block: None,
                    name,
                });
            }
            Ok(_) => {}
        }
    }
}

/// Splits a printed descriptor such as `font-display: swap` into name and value.
pub(super) fn descriptor_parts(css: &str) -> Result<(String, &str)> {
    let malformed = || Error::Parse(format!("expected `name: value`, found `{}`", css.trim()));

    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let name = parser.expect_ident().map_err(|_| malformed())?.to_string();
    parser.expect_colon().map_err(|_| malformed())?;

    let start = parser.position();
    while parser.next().is_ok() {}
    Ok((name, parser.slice_from(start).trim()))
}

/// The `@charset` encoding and the comments heading a stylesheet, before the
/// first rule. LightningCSS keeps neither.
pub(super) fn leading_trivia(css_text: &str) -> (Option<String>, Vec<&str>) {
    let mut input = ParserInput::new(css_text.trim_start_matches('\u{feff}'));
    let mut parser = Parser::new(&mut input);
    let mut charset = None;
    let mut comments = Vec::new();

    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        match token {
            Token::WhiteSpace(_) => {}
            Token::Comment(text) => comments.push(*text),
            Token::AtKeyword(name) if charset.is_none() && name.eq_ignore_ascii_case("charset") => {
                match parser.next() {
                    Ok(Token::QuotedString(encoding)) => {
                        charset = Some(format!("\"{}\"", encoding));
                    }
                    _ => break,
                }
                if !matches!(parser.next(), Ok(Token::Semicolon)) {
                    break;
                }
            }
            _ => break,
        }
    }
    (charset, comments)
}

/// Counts every comment in `css`, nested blocks included.
pub(super) fn count_comments(css: &str) -> usize {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    count_comments_recursive(&mut parser)
}

fn count_comments_recursive(parser: &mut Parser) -> usize {
    let mut count = 0;
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        match token {
            Token::Comment(_) => count += 1,
            Token::CurlyBracketBlock
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::Function(_) => {
                count += parser
                    .parse_nested_block(|p| Ok::<_, CssParseError>(count_comments_recursive(p)))
                    .unwrap_or(0);
            }
            _ => {}
        }
    }
    count
}
