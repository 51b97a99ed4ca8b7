//! Syntax kinds for the grammar DSL.
//!
//! `SyntaxKind` covers both token kinds (from the lexer) and node kinds (from
//! the parser). Logos derives token recognition; node kinds carry no
//! attributes. `GrammarLang` implements Rowan's `Language` trait.

use logos::Logos;
use rowan::Language;

use super::lexer::lex_code;

/// All token and node kinds. Tokens first, then nodes, then `__LAST`.
/// `#[repr(u16)]` makes the transmute in `kind_from_raw` sound.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    #[token(":")]
    Colon = 0,

    #[token("=")]
    Equals,

    #[token("*")]
    Star,

    #[token("?")]
    Question,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("<")]
    AngleOpen,

    #[token(">")]
    AngleClose,

    #[token("|")]
    Pipe,

    #[token("%")]
    Percent,

    #[token(";")]
    Semicolon,

    /// Names of tokens, expressions, types, bindings and directive words.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Text,

    /// Repeat bound.
    #[regex(r"[0-9]+")]
    Num,

    /// Verbatim target code: a run of `n` opening braces up to the matching
    /// close. Unterminated blocks run to the end of input and are reported by
    /// the parser.
    #[token("{", lex_code)]
    Code,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    #[token("\r")]
    Newline,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    /// Coalesced unrecognized characters
    Garbage,
    Error,

    // --- Node kinds ---
    Root,
    Directive,
    Def,
    /// `: name` suffix: a type on definitions and directives, a bind-tag on
    /// references and snippets.
    Tag,
    Branches,
    Seq,
    Ref,
    Group,
    Optional,
    Repeat,
    Recovery,
    Snippet,

    // Must be last - used for bounds checking in `kind_from_raw`
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | Newline | Comment)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Error | Garbage)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarLang {}

impl Language for GrammarLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: the value is in bounds and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<GrammarLang>;
pub type SyntaxToken = rowan::SyntaxToken<GrammarLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// 64-bit bitset of `SyntaxKind`s for O(1) membership testing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KindSet(u64);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    /// Panics at compile time if any kind's discriminant >= 64.
    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 64, "SyntaxKind value exceeds KindSet capacity");
            bits |= 1 << kind;
            i += 1;
        }
        KindSet(bits)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= 64 {
            return false;
        }
        self.0 & (1 << kind) != 0
    }

    #[inline]
    pub const fn union(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }
}

impl std::fmt::Debug for KindSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        for i in 0..(__LAST as u16).min(64) {
            if self.0 & (1 << i) != 0 {
                // SAFETY: i < __LAST and SyntaxKind is repr(u16)
                let kind: SyntaxKind = unsafe { std::mem::transmute(i) };
                list.entry(&kind);
            }
        }
        list.finish()
    }
}

/// Pre-defined kind sets for the parser.
pub mod kind_sets {
    use super::*;

    pub const TERM_FIRST: KindSet =
        KindSet::new(&[Text, Num, Star, ParenOpen, BracketOpen, AngleOpen]);

    /// Tokens that may appear as directive arguments.
    pub const DIRECTIVE_ARGS: KindSet = KindSet::new(&[Text, Code, Num]);

    /// Where a broken statement gives up and the next one starts.
    pub const STMT_RECOVERY: KindSet = KindSet::new(&[Semicolon, Percent]);

    /// Tokens that close an enclosing construct; a sequence stops before them.
    pub const SEQ_END: KindSet = KindSet::new(&[
        Pipe,
        Semicolon,
        ParenClose,
        BracketClose,
        AngleClose,
        Question,
    ]);
}
