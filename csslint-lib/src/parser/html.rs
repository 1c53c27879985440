//! This module pulls the contents of `<style>` elements out of an HTML document.
//!
//! It uses html5ever as the HTML parser with a minimal `TreeSink` that keeps
//! no tree at all: only element names and the raw text appended to styles.

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::debug;
use std::borrow::Cow;
use std::cell::RefCell;

/// Returns the text of every `<style>` element, in document order.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// One string per `<style>` element, empty ones included. The text is the
/// raw element content with `\r\n` and `\r` normalised to `\n`.
pub fn extract_style_blocks(html_content: &str) -> Vec<String> {
    let sink = StyleBlockSink::new();
    html5ever::parse_document(sink, Default::default()).one(html_content.to_string())
}

/// Bookkeeping for one handle handed out to the parser.
#[derive(Debug)]
struct SinkNode {
    ns: Namespace,
    local: LocalName,
    is_style: bool,
    text: String,
}

impl SinkNode {
    fn placeholder() -> Self {
        SinkNode {
            ns: Namespace::from(""),
            local: LocalName::from(""),
            is_style: false,
            text: String::new(),
        }
    }
}

/// A TreeSink whose handles are indices into a flat list of nodes.
/// Index 0 is the document.
pub struct StyleBlockSink {
    nodes: RefCell<Vec<SinkNode>>,
}

impl StyleBlockSink {
    /// Creates a sink holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![SinkNode::placeholder()]),
        }
    }

    fn push(&self, node: SinkNode) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        nodes.len() - 1
    }
}

impl Default for StyleBlockSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned copy of an element name, handed to the parser on request.
#[derive(Debug)]
pub struct StyleElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for StyleElemName {
    /// Returns a reference to the local name of the element.
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    /// Returns a reference to the namespace of the element.
    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for StyleBlockSink {
    type Handle = usize;
    type Output = Vec<String>;
    type ElemName<'a>
        = StyleElemName
    where
        Self: 'a;

    /// Collects the style texts; elements were created in document order.
    fn finish(self) -> Self::Output {
        self.nodes
            .into_inner()
            .into_iter()
            .filter(|node| node.is_style)
            .map(|node| node.text)
            .collect()
    }

    /// Parse errors are logged and otherwise ignored.
    fn parse_error(&self, msg: Cow<'static, str>) {
        debug!("html parse error: {}", msg);
    }

    /// Returns the handle to the document node.
    fn get_document(&self) -> Self::Handle {
        0
    }

    /// Returns the element name for the given handle.
    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        let nodes = self.nodes.borrow();
        let node = &nodes[*target];
        StyleElemName {
            ns: node.ns.clone(),
            local: node.local.clone(),
        }
    }

    /// Records a new element, flagging `<style>` elements.
    fn create_element(
        &self,
        name: QualName,
        _attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let is_style = &*name.local == "style";
        self.push(SinkNode {
            ns: name.ns,
            local: name.local,
            is_style,
            text: String::new(),
        })
    }

    /// Comments get a placeholder handle.
    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.push(SinkNode::placeholder())
    }

    /// Processing instructions get a placeholder handle.
    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.push(SinkNode::placeholder())
    }

    /// Only text landing in a `<style>` element is kept.
    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        if let NodeOrText::AppendText(text) = child {
            let mut nodes = self.nodes.borrow_mut();
            let node = &mut nodes[*parent];
            if node.is_style {
                node.text.push_str(&text);
            }
        }
    }

    /// Foster parenting never moves style text.
    fn append_based_on_parent_node(
        &self,
        _element: &Self::Handle,
        _prev_element: &Self::Handle,
        _child: NodeOrText<Self::Handle>,
    ) {
    }

    /// Not used in this implementation.
    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    /// Not used in this implementation.
    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    /// There is no stack of open nodes to pop.
    fn pop(&self, _node: &Self::Handle) {}

    /// A template is its own contents holder.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    /// Determines if two node handles refer to the same node.
    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    /// Quirks mode does not affect style text.
    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    /// Text is only inserted before siblings in tables, never in styles.
    fn append_before_sibling(&self, _sibling: &Self::Handle, _child: NodeOrText<Self::Handle>) {}

    /// Attributes are not kept.
    fn add_attrs_if_missing(&self, _target: &Self::Handle, _attrs: Vec<Attribute>) {}

    /// Not used in this implementation.
    fn remove_from_parent(&self, _target: &Self::Handle) {}

    /// Not used in this implementation.
    fn reparent_children(&self, _node: &Self::Handle, _new_parent: &Self::Handle) {}
}
