//! Typed AST wrappers over CST nodes.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors. Accessors
//! return `None` for parts the parser had to skip; validation happens while
//! lowering.

use rowan::TextRange;

use super::cst::{SyntaxKind, SyntaxNode, SyntaxToken};
use super::lexer::code_body;

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn as_cst(&self) -> &SyntaxNode {
                &self.0
            }

            pub fn text_range(&self) -> TextRange {
                self.0.text_range()
            }
        }
    };
}

ast_node!(Root, Root);
ast_node!(Directive, Directive);
ast_node!(Def, Def);
ast_node!(Tag, Tag);
ast_node!(Branches, Branches);
ast_node!(Seq, Seq);
ast_node!(Ref, Ref);
ast_node!(Group, Group);
ast_node!(Optional, Optional);
ast_node!(Repeat, Repeat);
ast_node!(Recovery, Recovery);
ast_node!(Snippet, Snippet);

/// Top-level item: statements and the code blocks around them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Directive(Directive),
    Def(Def),
    Snippet(Snippet),
}

/// Anything that can stand in a sequence and match input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Ref(Ref),
    Group(Group),
    Optional(Optional),
    Repeat(Repeat),
    Recovery(Recovery),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeqItem {
    Term(Term),
    Snippet(Snippet),
}

impl Term {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::Ref => Ref::cast(node).map(Term::Ref),
            SyntaxKind::Group => Group::cast(node).map(Term::Group),
            SyntaxKind::Optional => Optional::cast(node).map(Term::Optional),
            SyntaxKind::Repeat => Repeat::cast(node).map(Term::Repeat),
            SyntaxKind::Recovery => Recovery::cast(node).map(Term::Recovery),
            _ => None,
        }
    }

    pub fn as_cst(&self) -> &SyntaxNode {
        match self {
            Term::Ref(n) => n.as_cst(),
            Term::Group(n) => n.as_cst(),
            Term::Optional(n) => n.as_cst(),
            Term::Repeat(n) => n.as_cst(),
            Term::Recovery(n) => n.as_cst(),
        }
    }
}

fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

impl Root {
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.0.children().filter_map(|node| match node.kind() {
            SyntaxKind::Directive => Directive::cast(node).map(Item::Directive),
            SyntaxKind::Def => Def::cast(node).map(Item::Def),
            SyntaxKind::Snippet => Snippet::cast(node).map(Item::Snippet),
            _ => None,
        })
    }
}

impl Directive {
    /// The word after `%`.
    pub fn keyword(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::Text)
    }

    pub fn tag(&self) -> Option<Tag> {
        self.0.children().find_map(Tag::cast)
    }

    /// Arguments after the keyword and tag, in order.
    pub fn args(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Text | SyntaxKind::Code | SyntaxKind::Num))
            .skip(1)
            .collect()
    }
}

impl Def {
    pub fn name(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::Text)
    }

    pub fn type_tag(&self) -> Option<Tag> {
        self.0.children().find_map(Tag::cast)
    }

    pub fn body(&self) -> Option<Branches> {
        self.0.children().find_map(Branches::cast)
    }

    /// `NAME;` declares a token; an expression has `=`.
    pub fn is_token(&self) -> bool {
        token(&self.0, SyntaxKind::Equals).is_none()
    }
}

impl Tag {
    pub fn name(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::Text)
    }
}

impl Branches {
    pub fn seqs(&self) -> impl Iterator<Item = Seq> + '_ {
        self.0.children().filter_map(Seq::cast)
    }
}

impl Seq {
    pub fn items(&self) -> impl Iterator<Item = SeqItem> + '_ {
        self.0.children().filter_map(|node| {
            if node.kind() == SyntaxKind::Snippet {
                Snippet::cast(node).map(SeqItem::Snippet)
            } else {
                Term::cast(node).map(SeqItem::Term)
            }
        })
    }
}

impl Ref {
    pub fn name(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::Text)
    }

    pub fn bind(&self) -> Option<Tag> {
        self.0.children().find_map(Tag::cast)
    }
}

impl Group {
    pub fn body(&self) -> Option<Branches> {
        self.0.children().find_map(Branches::cast)
    }
}

impl Optional {
    pub fn body(&self) -> Option<Branches> {
        self.0.children().find_map(Branches::cast)
    }
}

impl Repeat {
    /// Bound written before `*`.
    pub fn min(&self) -> Option<SyntaxToken> {
        self.bound(false)
    }

    /// Bound written after `*`.
    pub fn max(&self) -> Option<SyntaxToken> {
        self.bound(true)
    }

    fn bound(&self, after_star: bool) -> Option<SyntaxToken> {
        let mut seen_star = false;
        for token in self.0.children_with_tokens().filter_map(|it| it.into_token()) {
            match token.kind() {
                SyntaxKind::Star => seen_star = true,
                SyntaxKind::Num if seen_star == after_star => return Some(token),
                _ => {}
            }
        }
        None
    }

    /// Range of the bounds and the star, for bound diagnostics.
    pub fn bounds_range(&self) -> TextRange {
        let mut range: Option<TextRange> = None;
        for token in self.0.children_with_tokens().filter_map(|it| it.into_token()) {
            if matches!(token.kind(), SyntaxKind::Star | SyntaxKind::Num) {
                let r = token.text_range();
                range = Some(range.map_or(r, |acc| acc.cover(r)));
            }
        }
        range.unwrap_or_else(|| self.text_range())
    }

    pub fn inner(&self) -> Option<Term> {
        self.0.children().find_map(Term::cast)
    }
}

impl Recovery {
    pub fn body(&self) -> Option<Branches> {
        self.0.children().find_map(Branches::cast)
    }

    /// Snippets after `?`.
    pub fn handlers(&self) -> impl Iterator<Item = Snippet> + '_ {
        self.0.children().filter_map(Snippet::cast)
    }
}

impl Snippet {
    pub fn code(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::Code)
    }

    /// Code between the braces; `None` when the block is unterminated.
    pub fn body(&self) -> Option<String> {
        let code = self.code()?;
        code_body(code.text()).map(str::to_string)
    }

    pub fn bind(&self) -> Option<Tag> {
        self.0.children().find_map(Tag::cast)
    }
}
