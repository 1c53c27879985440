//! Re-serialization of a [`CssTree`] in one of two layouts.
//!
//! Both printers walk the tree depth-first from the root, children in source
//! order. Every container prints its own subtree, so each node is written
//! exactly once. Rules nested in `@keyframes` are only reachable through the
//! keyframes branch of the at-rule printer; the generic dispatch skips them.

mod compact;
mod nested;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, FormatError};
use crate::tree::{AtRuleNode, CssTree, DeclarationNode, NodeId, NodeKind};

/// One indentation step.
pub const INDENT: &str = "  ";

/// Canonical rendering of any `@charset` rule.
pub const CHARSET: &str = "@charset \"utf-8\";";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One line per rule.
    Compact,
    /// One line per declaration, indentation follows nesting.
    Nested,
}

impl OutputStyle {
    pub const ALL: [OutputStyle; 2] = [OutputStyle::Compact, OutputStyle::Nested];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Compact => "compact",
            OutputStyle::Nested => "nested",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unsupported output style `{}`; available styles: compact, nested",
                    s
                ))
            })
    }
}

/// Prints `tree` in the requested layout.
///
/// The result is trimmed at both ends. Fails only for malformed trees, in
/// which case nothing is printed.
pub fn format(tree: &CssTree, style: OutputStyle) -> Result<String, FormatError> {
    validate(tree)?;
    let out = match style {
        OutputStyle::Compact => compact::print(tree),
        OutputStyle::Nested => nested::print(tree),
    };
    Ok(out.trim().to_string())
}

/// Rejects shapes the printers have no place for.
fn validate(tree: &CssTree) -> Result<(), FormatError> {
    let root = tree.root();
    for id in tree.descendants(root) {
        let has_children = !tree.children(id).is_empty();
        match tree.kind(id) {
            NodeKind::Root => return Err(FormatError::NestedRoot),
            NodeKind::Declaration(decl) => {
                if tree.parent(id) == Some(root) {
                    return Err(FormatError::OrphanDeclaration {
                        prop: decl.prop.clone(),
                    });
                }
                if has_children {
                    return Err(FormatError::LeafWithChildren {
                        kind: "declaration",
                    });
                }
            }
            NodeKind::Comment(_) if has_children => {
                return Err(FormatError::LeafWithChildren { kind: "comment" });
            }
            NodeKind::AtRule(at_rule) if at_rule.is_charset() && has_children => {
                return Err(FormatError::LeafWithChildren { kind: "charset" });
            }
            NodeKind::Rule(_) | NodeKind::AtRule(_) | NodeKind::Comment(_) => {}
        }
    }
    Ok(())
}

/// How an at-rule is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AtRuleForm {
    Charset,
    /// `@import url(a.css);`
    Statement,
    /// Body holds rules: `@media`, `@keyframes`, `@supports`, ...
    Block,
    /// Body holds declarations only: `@font-face`, `@page`, ...
    Declarations,
}

pub(crate) fn at_rule_form(tree: &CssTree, id: NodeId, at_rule: &AtRuleNode) -> AtRuleForm {
    let children = tree.children(id);
    if at_rule.is_charset() {
        return AtRuleForm::Charset;
    }
    if !at_rule.has_block && children.is_empty() {
        return AtRuleForm::Statement;
    }
    let holds_rules = children
        .iter()
        .any(|&child| matches!(tree.kind(child), NodeKind::Rule(_) | NodeKind::AtRule(_)));
    if at_rule.is_keyframes() || at_rule.is_media() || holds_rules {
        AtRuleForm::Block
    } else {
        AtRuleForm::Declarations
    }
}

/// `@name params`, without a trailing space when params are empty.
pub(crate) fn header(at_rule: &AtRuleNode) -> String {
    let params = at_rule.params.trim();
    if params.is_empty() {
        format!("@{}", at_rule.name)
    } else {
        format!("@{} {}", at_rule.name, params)
    }
}

/// `p1: v1; p2: v2;`, or an empty string when there are no declarations.
pub(crate) fn declaration_block(tree: &CssTree, id: NodeId) -> String {
    let pairs: Vec<String> = tree.declarations(id).map(DeclarationNode::to_pair).collect();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{};", pairs.join("; "))
    }
}

pub(crate) fn comment(text: &str) -> String {
    format!("/* {} */", text.trim())
}

pub(crate) fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}
