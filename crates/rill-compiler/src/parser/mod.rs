//! Parser infrastructure for the grammar DSL.
//!
//! Produces a lossless concrete syntax tree via Rowan's green tree builder:
//!
//! - Zero-copy lexing: tokens carry spans, text sliced only when building nodes
//! - Trivia buffering: whitespace and comments are attached before the next node
//! - Statement-level recovery: a broken statement is skipped up to its `;`
//!
//! The parser always produces a tree. Fuel exhaustion (exec or recursion)
//! is the only hard failure.

pub mod ast;
pub mod cst;
pub mod lexer;

mod core;
mod grammar;

#[cfg(test)]
mod ast_tests;
#[cfg(test)]
mod lexer_tests;

use std::fmt::Write as _;

pub use ast::{
    Branches, Def, Directive, Group, Item, Optional, Recovery, Ref, Repeat, Root, Seq, SeqItem,
    Snippet, Tag, Term,
};
pub use cst::{SyntaxKind, SyntaxNode, SyntaxToken};

pub use core::Parser;

use crate::PassResult;
use lexer::lex;

/// Parse result containing the green tree.
///
/// The tree is always complete; diagnostics are returned separately.
#[derive(Debug, Clone)]
pub struct Parse {
    cst: rowan::GreenNode,
}

impl Parse {
    pub fn as_cst(&self) -> &rowan::GreenNode {
        &self.cst
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.cst.clone())
    }

    pub fn root(&self) -> Option<Root> {
        Root::cast(self.syntax())
    }
}

/// Main entry point. Returns Err on fuel exhaustion.
pub fn parse(source: &str) -> PassResult<Parse> {
    parse_with_parser(Parser::new(source, lex(source)))
}

/// Parse with a pre-configured parser (for custom fuel limits).
pub(crate) fn parse_with_parser(mut parser: Parser) -> PassResult<Parse> {
    parser.parse_root();
    let (cst, diagnostics) = parser.finish()?;
    Ok((Parse { cst }, diagnostics))
}

/// Indented node/token listing with trivia omitted, for tests and debugging.
pub fn dump_cst(node: &SyntaxNode) -> String {
    let mut out = String::new();
    dump_node(&mut out, node, 0);
    out
}

fn dump_node(out: &mut String, node: &SyntaxNode, depth: usize) {
    writeln!(out, "{:indent$}{:?}", "", node.kind(), indent = depth * 2).unwrap();
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => dump_node(out, &n, depth + 1),
            rowan::NodeOrToken::Token(t) if !t.kind().is_trivia() => {
                writeln!(
                    out,
                    "{:indent$}{:?} {:?}",
                    "",
                    t.kind(),
                    t.text(),
                    indent = (depth + 1) * 2
                )
                .unwrap();
            }
            rowan::NodeOrToken::Token(_) => {}
        }
    }
}
