//! Lexer for the grammar DSL.
//!
//! Produces span-based tokens without storing text; text is sliced from the
//! source only when needed. Consecutive unrecognized characters are coalesced
//! into one `Garbage` token.

use logos::Logos;
use rowan::TextRange;
use std::ops::Range;

use super::cst::SyntaxKind;

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: SyntaxKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = SyntaxKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        SyntaxKind::Garbage,
                        range_to_text_range(start..end),
                    ));
                }
                tokens.push(Token::new(kind, range_to_text_range(lexer.span())));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        SyntaxKind::Garbage,
                        range_to_text_range(start..source.len()),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// Logos callback for `Code`, positioned just after the first `{`.
pub(super) fn lex_code(lex: &mut logos::Lexer<SyntaxKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let (extra, len) = code_extent(rest);
    lex.bump(extra + len.unwrap_or(rest.len() - extra));
    true
}

/// Measures a code block whose first `{` was already consumed.
///
/// Returns the number of further opening braces and, when the block is
/// terminated, the length of the remainder up to and including the closing
/// run. One brace means balanced nesting; `n` braces end at the first run of
/// `n` closing braces.
fn code_extent(rest: &[u8]) -> (usize, Option<usize>) {
    let extra = rest.iter().take_while(|&&b| b == b'{').count();
    let body = &rest[extra..];
    let len = if extra == 0 {
        balanced_close(body)
    } else {
        let run = extra + 1;
        body.windows(run)
            .position(|w| w.iter().all(|&b| b == b'}'))
            .map(|i| i + run)
    };
    (extra, len)
}

fn balanced_close(body: &[u8]) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in body.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Contents of a `Code` token without its braces, or `None` if the block
/// was never closed.
pub fn code_body(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('{')?;
    let (extra, len) = code_extent(rest.as_bytes());
    let len = len?;
    if extra + len != rest.len() {
        return None;
    }
    let n = extra + 1;
    text.get(n..text.len() - n)
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'q>(source: &'q str, token: &Token) -> &'q str {
    &source[std::ops::Range::<usize>::from(token.span)]
}
