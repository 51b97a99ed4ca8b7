//! References from snippet code to semantic values and locations.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `$$` or `$name`
    Value,
    /// `@$` or `@name`
    Location,
}

/// One `$`/`@` reference inside snippet code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRef {
    pub kind: RefKind,
    /// Bind-tag name; `None` for the expression's own output.
    pub name: Option<String>,
    /// Byte range of the whole reference within the code.
    pub span: Range<usize>,
}

/// Extract references in source order. String and character literals are
/// skipped so `"$x"` stays text.
pub fn scan_refs(code: &str) -> Vec<CodeRef> {
    let bytes = code.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => i = skip_literal(bytes, i, quote),
            sigil @ (b'$' | b'@') => {
                let kind = if sigil == b'$' {
                    RefKind::Value
                } else {
                    RefKind::Location
                };
                let start = i;
                i += 1;
                if bytes.get(i) == Some(&b'$') {
                    i += 1;
                    refs.push(CodeRef {
                        kind,
                        name: None,
                        span: start..i,
                    });
                } else if bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
                    let name_start = i;
                    while bytes
                        .get(i)
                        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                    {
                        i += 1;
                    }
                    refs.push(CodeRef {
                        kind,
                        name: Some(code[name_start..i].to_string()),
                        span: start..i,
                    });
                }
            }
            _ => i += 1,
        }
    }

    refs
}

/// Index just past the literal opened at `start`.
fn skip_literal(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Rewrite every reference through `replace`, keeping the rest verbatim.
pub fn substitute_refs(code: &str, refs: &[CodeRef], mut replace: impl FnMut(&CodeRef) -> String) -> String {
    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    for r in refs {
        out.push_str(&code[last..r.span.start]);
        out.push_str(&replace(r));
        last = r.span.end;
    }
    out.push_str(&code[last..]);
    out
}
