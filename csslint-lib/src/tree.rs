//! Arena-backed CSS syntax tree.
//!
//! Nodes live in a single `Vec` owned by [`CssTree`]; children and parents are
//! referenced by [`NodeId`] so the parent link never owns the enclosing node.

/// Index of a node inside its [`CssTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Rule(RuleNode),
    AtRule(AtRuleNode),
    Declaration(DeclarationNode),
    Comment(CommentNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    /// e.g. "body", ".red > #blue", "0%"
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRuleNode {
    /// Keyword without the `@`, e.g. "media", "-webkit-keyframes".
    pub name: String,
    pub params: String,
    /// False for statement at-rules such as `@import url(a.css);`.
    pub has_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationNode {
    pub prop: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    /// Body between `/*` and `*/`, untrimmed.
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl AtRuleNode {
    /// True for `@keyframes` and its vendor-prefixed spellings.
    pub fn is_keyframes(&self) -> bool {
        strip_vendor_prefix(&self.name).eq_ignore_ascii_case("keyframes")
    }

    pub fn is_media(&self) -> bool {
        self.name.eq_ignore_ascii_case("media")
    }

    pub fn is_charset(&self) -> bool {
        self.name.eq_ignore_ascii_case("charset")
    }
}

impl DeclarationNode {
    /// `prop: value`, with ` !important` appended when flagged.
    pub fn to_pair(&self) -> String {
        if self.important {
            format!("{}: {} !important", self.prop, self.value)
        } else {
            format!("{}: {}", self.prop, self.value)
        }
    }
}

fn strip_vendor_prefix(name: &str) -> &str {
    ["-webkit-", "-moz-", "-ms-", "-o-"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// A parsed stylesheet. Node 0 is always the root.
#[derive(Debug, Clone)]
pub struct CssTree {
    nodes: Vec<Node>,
}

impl Default for CssTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CssTree {
    pub fn new() -> Self {
        CssTree {
            nodes: vec![Node::new(NodeKind::Root, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Appends `kind` as the last child of `parent` and returns its id.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_rule(&mut self, parent: NodeId, selector: impl Into<String>) -> NodeId {
        self.append(
            parent,
            NodeKind::Rule(RuleNode {
                selector: selector.into(),
            }),
        )
    }

    pub fn append_at_rule(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        params: impl Into<String>,
    ) -> NodeId {
        self.append(
            parent,
            NodeKind::AtRule(AtRuleNode {
                name: name.into(),
                params: params.into(),
                has_block: true,
            }),
        )
    }

    /// Appends a block-less at-rule such as `@import` or `@charset`.
    pub fn append_statement(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        params: impl Into<String>,
    ) -> NodeId {
        self.append(
            parent,
            NodeKind::AtRule(AtRuleNode {
                name: name.into(),
                params: params.into(),
                has_block: false,
            }),
        )
    }

    pub fn append_declaration(
        &mut self,
        parent: NodeId,
        prop: impl Into<String>,
        value: impl Into<String>,
        important: bool,
    ) -> NodeId {
        self.append(
            parent,
            NodeKind::Declaration(DeclarationNode {
                prop: prop.into(),
                value: value.into(),
                important,
            }),
        )
    }

    pub fn append_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Comment(CommentNode { text: text.into() }))
    }

    /// Walks parent links from `id` upwards, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// The closest enclosing at-rule, skipping rules in between.
    pub fn nearest_at_rule(&self, id: NodeId) -> Option<&AtRuleNode> {
        self.ancestors(id).find_map(|ancestor| match self.kind(ancestor) {
            NodeKind::AtRule(at_rule) => Some(at_rule),
            _ => None,
        })
    }

    /// True when `id` is a Rule whose nearest at-rule ancestor is `@keyframes`.
    pub fn is_keyframe_selector(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Rule(_))
            && self
                .nearest_at_rule(id)
                .is_some_and(|at_rule| at_rule.is_keyframes())
    }

    /// Direct Declaration children of `id`, in source order.
    pub fn declarations(&self, id: NodeId) -> impl Iterator<Item = &DeclarationNode> + '_ {
        self.children(id)
            .iter()
            .filter_map(|&child| match self.kind(child) {
                NodeKind::Declaration(decl) => Some(decl),
                _ => None,
            })
    }

    /// Pre-order ids of every node below `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}

pub struct Ancestors<'a> {
    tree: &'a CssTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyframes_tree() -> (CssTree, NodeId, NodeId) {
        let mut tree = CssTree::new();
        let root = tree.root();
        let keyframes = tree.append_at_rule(root, "keyframes", "fade");
        let frame = tree.append_rule(keyframes, "0%");
        tree.append_declaration(frame, "opacity", "0", false);
        let body = tree.append_rule(root, "body");
        (tree, frame, body)
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let a = tree.append_rule(root, "a");
        let b = tree.append_comment(root, " note ");
        let c = tree.append_at_rule(root, "media", "print");
        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn test_keyframe_selector_detection() {
        let (tree, frame, body) = keyframes_tree();
        assert!(tree.is_keyframe_selector(frame));
        assert!(!tree.is_keyframe_selector(body));
    }

    #[test]
    fn test_keyframe_selector_through_nested_rule() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let media = tree.append_at_rule(root, "media", "screen");
        let keyframes = tree.append_at_rule(media, "-webkit-keyframes", "spin");
        let to = tree.append_rule(keyframes, "to");
        let inner = tree.append_rule(to, "&");
        assert!(tree.is_keyframe_selector(to));
        assert!(tree.is_keyframe_selector(inner));
        assert_eq!(tree.ancestors(inner).count(), 4);
    }

    #[test]
    fn test_declarations_are_direct_children_only() {
        let mut tree = CssTree::new();
        let root = tree.root();
        let rule = tree.append_rule(root, ".card");
        tree.append_declaration(rule, "color", "red", false);
        let nested = tree.append_rule(rule, "&:hover");
        tree.append_declaration(nested, "color", "blue", false);
        tree.append_declaration(rule, "margin", "0", true);

        let pairs: Vec<String> = tree.declarations(rule).map(|d| d.to_pair()).collect();
        assert_eq!(pairs, vec!["color: red", "margin: 0 !important"]);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let (tree, frame, body) = keyframes_tree();
        let order = tree.descendants(tree.root());
        assert_eq!(order.len(), tree.len() - 1);
        let frame_pos = order.iter().position(|&id| id == frame);
        let body_pos = order.iter().position(|&id| id == body);
        assert!(frame_pos < body_pos);
    }
}
