//! Nested layout: one declaration per line, indentation follows depth.

use super::{at_rule_form, comment, header, push_line, AtRuleForm, CHARSET};
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
        NodeKind::Declaration(_) | NodeKind::Root => {}
    }
}

fn emit_owned(tree: &CssTree, id: NodeId, depth: usize, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Rule(rule) => emit_rule(tree, id, rule, depth, out),
        _ => emit(tree, id, depth, out),
    }
}

fn emit_declarations(tree: &CssTree, id: NodeId, depth: usize, out: &mut String) {
    for decl in tree.declarations(id) {
        push_line(out, depth, &format!("{};", decl.to_pair()));
    }
}

fn emit_rule(tree: &CssTree, id: NodeId, rule: &RuleNode, depth: usize, out: &mut String) {
    push_line(out, depth, &format!("{} {{", rule.selector));
    emit_declarations(tree, id, depth + 1, out);
    for &child in tree.children(id) {
        emit_owned(tree, child, depth + 1, out);
    }
    push_line(out, depth, "}");
}

fn emit_at_rule(tree: &CssTree, id: NodeId, at_rule: &AtRuleNode, depth: usize, out: &mut String) {
    let form = at_rule_form(tree, id, at_rule);
    match form {
        AtRuleForm::Charset => {
            push_line(out, depth, CHARSET);
            return;
        }
        AtRuleForm::Statement => {
            push_line(out, depth, &format!("{};", header(at_rule)));
            return;
        }
        AtRuleForm::Block | AtRuleForm::Declarations => {}
    }

    push_line(out, depth, &format!("{} {{", header(at_rule)));
    emit_declarations(tree, id, depth + 1, out);
    for &child in tree.children(id) {
        if at_rule.is_keyframes() {
            emit_owned(tree, child, depth + 1, out);
        } else {
            emit(tree, child, depth + 1, out);
        }
    }
    push_line(out, depth, "}");
}

#[cfg(test)]
mod tests {
    use crate::format::{format, OutputStyle};
    use crate::tree::CssTree;
    use pretty_assertions::assert_eq;

    fn nested(tree: &CssTree) -> String {
        format(tree, OutputStyle::Nested).unwrap()
    }

    #[test]
    fn test_simple_rule() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let body = tree.append_rule(root, "body");
        tree.append_declaration(body, "color", "red", false);
        tree.append_declaration(body, "margin", "0", false);
        assert_eq!(nested(&tree), "body {\n  color: red;\n  margin: 0;\n}");
    }

    #[test]
    fn test_empty_rule() {
        let mut tree = CssTree::new();
        let root = tree.root();
        tree.append_rule(root, "body");
        assert_eq!(nested(&tree), "body {\n}");
    }

    #[test]
    fn test_charset_inside_block_keeps_indent() {
        let mut tree = CssTree::new();
        let root = tree.root();
        tree.append_statement(root, "charset", "'UTF-8'");
        let layer = tree.append_at_rule(root, "layer", "base");
        tree.append_statement(layer, "Charset", "\"latin1\"");
        tree.append_rule(layer, "p");

        assert_eq!(
            nested(&tree),
            "@charset \"utf-8\";\n@layer base {\n  @charset \"utf-8\";\n  p {\n  }\n}"
        );
    }

    #[test]
    fn test_media_rules_are_indented_once() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let media = tree.append_at_rule(root, "media", "screen and (max-width: 600px)");
        let body = tree.append_rule(media, "body");
        tree.append_declaration(body, "font-size", "14px", false);

        assert_eq!(
            nested(&tree),
            "@media screen and (max-width: 600px) {\n  body {\n    font-size: 14px;\n  }\n}"
        );
    }

    #[test]
    fn test_keyframes() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let fade = tree.append_at_rule(root, "keyframes", "fade");
        let from = tree.append_rule(fade, "0%");
        tree.append_declaration(from, "opacity", "0", false);
        let to = tree.append_rule(fade, "100%");
        tree.append_declaration(to, "opacity", "1", false);

        assert_eq!(
            nested(&tree),
            "@keyframes fade {\n  0% {\n    opacity: 0;\n  }\n  100% {\n    opacity: 1;\n  }\n}"
        );
    }

    #[test]
    fn test_other_at_rule_lists_declarations() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let font = tree.append_at_rule(root, "font-face", "");
        tree.append_declaration(font, "font-family", "Foo", false);
        tree.append_comment(font, "fallback below");

        assert_eq!(
            nested(&tree),
            "@font-face {\n  font-family: Foo;\n  /* fallback below */\n}"
        );
    }

    #[test]
    fn test_rule_inside_rule_inside_media() {
        let mut tree = CssTree::new();
        let root = tree.root();
        tree.append_comment(root, "Main styles");
        let media = tree.append_at_rule(root, "media", "print");
        let card = tree.append_rule(media, ".card");
        let title = tree.append_rule(card, ".title");
        tree.append_declaration(title, "font-weight", "bold", false);
        tree.append_declaration(card, "border", "none", false);

        assert_eq!(
            nested(&tree),
            "/* Main styles */\n\
             @media print {\n\
             \x20 .card {\n\
             \x20   border: none;\n\
             \x20   .title {\n\
             \x20     font-weight: bold;\n\
             \x20   }\n\
             \x20 }\n\
             }"
        );
    }

    #[test]
    fn test_at_rule_inside_rule() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let card = tree.append_rule(root, ".card");
        tree.append_declaration(card, "width", "50%", false);
        let media = tree.append_at_rule(card, "media", "(width < 600px)");
        let amp = tree.append_rule(media, "&");
        tree.append_declaration(amp, "width", "100%", false);

        assert_eq!(
            nested(&tree),
            ".card {\n  width: 50%;\n  @media (width < 600px) {\n    \
             & {\n      width: 100%;\n    }\n  }\n}"
        );
    }
}
