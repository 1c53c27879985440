//! Compact layout: each rule on a single line.

use super::{at_rule_form, comment, declaration_block, header, push_line, AtRuleForm, CHARSET};
use crate::tree::{AtRuleNode, CssTree, NodeId, NodeKind, RuleNode};

pub(super) fn print(tree: &CssTree) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        emit(tree, child, 0, &mut out);
    }
    out
}

/// Generic dispatch. Keyframe selectors are left to their `@keyframes` block.
fn emit(tree: &CssTree, id: NodeId, depth: usize, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Rule(rule) => {
            if tree.is_keyframe_selector(id) {
                return;
            }
            emit_rule(tree, id, rule, depth, out);
        }
        NodeKind::AtRule(at_rule) => emit_at_rule(tree, id, at_rule, depth, out),
        NodeKind::Comment(note) => push_line(out, depth, &comment(&note.text)),
        // Declarations are written by their enclosing block; a root here was
        // already rejected by validation.
        NodeKind::Declaration(_) | NodeKind::Root => {}
    }
}

/// Dispatch for children of a block that owns its rules outright.
fn emit_owned(tree: &CssTree, id: NodeId, depth: usize, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Rule(rule) => emit_rule(tree, id, rule, depth, out),
        _ => emit(tree, id, depth, out),
    }
}

fn emit_rule(tree: &CssTree, id: NodeId, rule: &RuleNode, depth: usize, out: &mut String) {
    let block = declaration_block(tree, id);
    if block.is_empty() {
        push_line(out, depth, &format!("{} {{}}", rule.selector));
    } else {
        push_line(out, depth, &format!("{} {{ {} }}", rule.selector, block));
    }
    for &child in tree.children(id) {
        emit_owned(tree, child, depth + 1, out);
    }
}

fn emit_at_rule(tree: &CssTree, id: NodeId, at_rule: &AtRuleNode, depth: usize, out: &mut String) {
    match at_rule_form(tree, id, at_rule) {
        AtRuleForm::Charset => push_line(out, depth, CHARSET),
        AtRuleForm::Statement => push_line(out, depth, &format!("{};", header(at_rule))),
        AtRuleForm::Block => {
            push_line(out, depth, &format!("{} {{", header(at_rule)));
            let block = declaration_block(tree, id);
            if !block.is_empty() {
                push_line(out, depth + 1, &block);
            }
            for &child in tree.children(id) {
                if at_rule.is_keyframes() {
                    emit_owned(tree, child, depth + 1, out);
                } else {
                    emit(tree, child, depth + 1, out);
                }
            }
            push_line(out, depth, "}");
        }
        AtRuleForm::Declarations => {
            let block = declaration_block(tree, id);
            if block.is_empty() {
                push_line(out, depth, &format!("{} {{}}", header(at_rule)));
            } else {
                push_line(out, depth, &format!("{} {{ {} }}", header(at_rule), block));
            }
            for &child in tree.children(id) {
                emit(tree, child, depth + 1, out);
            }
        }
    }
}
