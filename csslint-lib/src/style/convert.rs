use crate::error::{Error, Result};
use crate::style::tokens::{at_rule_parts, count_comments, descriptor_parts, leading_trivia};
use crate::tree::{CssTree, NodeId};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::error::{Error as LcssError, ParserError};
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::keyframes::KeyframesRule;
use lightningcss::rules::{style::StyleRule, CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleAttribute, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use lightningcss::vendor_prefix::VendorPrefix;
use log::{debug, log_enabled, Level};

/// Parse a CSS string with LightningCSS and convert it into a [`CssTree`].
///
/// The tokenizer drops `@charset` and comments, so the ones heading the
/// stylesheet are restored from the source text. Comments after the first
/// rule are not part of the tree.
///
/// # Arguments
///
/// * `css_text` - A complete stylesheet.
///
/// # Returns
///
/// The tree, or [`Error::Parse`] for CSS LightningCSS rejects.
pub fn parse_tree(css_text: &str) -> Result<CssTree> {
    let sheet = LightningStyleSheet::parse(css_text, ParserOptions::default())
        .map_err(|e: LcssError<ParserError<'_>>| Error::Parse(e.to_string()))?;

    let mut tree = CssTree::new();
    let root = tree.root();

    let (charset, comments) = leading_trivia(css_text);
    if let Some(encoding) = charset {
        tree.append_statement(root, "charset", encoding);
    }
    if log_enabled!(Level::Debug) {
        let dropped = count_comments(css_text).saturating_sub(comments.len());
        if dropped > 0 {
            debug!("{} comment(s) after the first rule are not kept", dropped);
        }
    }
    for comment in comments {
        tree.append_comment(root, comment);
    }
    append_rules(&mut tree, root, &sheet.rules)?;

    debug!("built css tree with {} nodes", tree.len());
    Ok(tree)
}

/// Converts a rule list in source order under `parent`.
fn append_rules(tree: &mut CssTree, parent: NodeId, rules: &CssRuleList<'_>) -> Result<()> {
    for rule in &rules.0 {
        match rule {
            CssRule::Style(style_rule) => append_style_rule(tree, parent, style_rule)?,
            CssRule::Media(media_rule) => {
                let id = tree.append_at_rule(parent, "media", css_string(&media_rule.query)?);
                append_rules(tree, id, &media_rule.rules)?;
            }
            CssRule::Keyframes(keyframes_rule) => {
                append_keyframes(tree, parent, keyframes_rule)?;
            }
            CssRule::Supports(supports_rule) => {
                let params = css_string(&supports_rule.condition)?;
                let id = tree.append_at_rule(parent, "supports", params);
                append_rules(tree, id, &supports_rule.rules)?;
            }
            CssRule::LayerBlock(layer_rule) => {
                let params = match &layer_rule.name {
                    Some(name) => css_string(name)?,
                    None => String::new(),
                };
                let id = tree.append_at_rule(parent, "layer", params);
                append_rules(tree, id, &layer_rule.rules)?;
            }
            CssRule::LayerStatement(layer_rule) => {
                let names = css_strings(&layer_rule.names)?;
                tree.append_statement(parent, "layer", names.join(", "));
            }
            CssRule::FontFace(font_face) => {
                let id = tree.append_at_rule(parent, "font-face", "");
                for property in &font_face.properties {
                    let printed = css_string(property)?;
                    let (name, value) = descriptor_parts(&printed)?;
                    tree.append_declaration(id, name, value, false);
                }
            }
            CssRule::Page(page_rule) => {
                let selectors = css_strings(&page_rule.selectors)?;
                let id = tree.append_at_rule(parent, "page", selectors.join(", "));
                append_declarations(tree, id, &page_rule.declarations)?;
                for margin_rule in &page_rule.rules {
                    let margin = tree.append_at_rule(id, css_string(&margin_rule.margin_box)?, "");
                    append_declarations(tree, margin, &margin_rule.declarations)?;
                }
            }
            CssRule::CounterStyle(counter_style) => {
                let name = css_string(&counter_style.name)?;
                let id = tree.append_at_rule(parent, "counter-style", name);
                append_declarations(tree, id, &counter_style.declarations)?;
            }
            CssRule::Nesting(nesting_rule) => append_style_rule(tree, parent, &nesting_rule.style)?,
            CssRule::Container(container_rule) => {
                append_grouping_rule(tree, parent, rule, &container_rule.rules)?;
            }
            CssRule::Scope(scope_rule) => {
                append_grouping_rule(tree, parent, rule, &scope_rule.rules)?;
            }
            CssRule::StartingStyle(starting_style) => {
                append_grouping_rule(tree, parent, rule, &starting_style.rules)?;
            }
            CssRule::MozDocument(document_rule) => {
                append_grouping_rule(tree, parent, rule, &document_rule.rules)?;
            }
            CssRule::Ignored => {}
            // @import, @namespace, @property, unknown at-rules and the rest
            other => append_printed_at_rule(tree, parent, other)?,
        }
    }
    Ok(())
}

/// A conditional group rule whose prelude is only available in printed form.
fn append_grouping_rule(
    tree: &mut CssTree,
    parent: NodeId,
    rule: &CssRule<'_>,
    rules: &CssRuleList<'_>,
) -> Result<()> {
    let printed = css_string(rule)?;
    let parts = at_rule_parts(&printed)?;
    let id = tree.append_at_rule(parent, parts.name, parts.prelude);
    append_rules(tree, id, rules)
}

/// Rules without typed conversion: the prelude is taken from the printed
/// rule and the block is parsed again by LightningCSS, first as a
/// declaration list, then as a rule list. A printed form that is not an
/// at-rule is read as declarations of `parent`.
fn append_printed_at_rule(tree: &mut CssTree, parent: NodeId, rule: &CssRule<'_>) -> Result<()> {
    let printed = css_string(rule)?;
    if !printed.trim_start().starts_with('@') {
        // declarations interleaved with nested rules
        let attribute = StyleAttribute::parse(&printed, ParserOptions::default())
            .map_err(|e: LcssError<ParserError<'_>>| Error::Parse(e.to_string()))?;
        return append_declarations(tree, parent, &attribute.declarations);
    }
    let parts = at_rule_parts(&printed)?;
    let Some(block) = parts.block else {
        tree.append_statement(parent, parts.name, parts.prelude);
        return Ok(());
    };

    let id = tree.append_at_rule(parent, parts.name, parts.prelude);
    if block.trim().is_empty() {
        return Ok(());
    }
    if let Ok(attribute) = StyleAttribute::parse(block, ParserOptions::default()) {
        return append_declarations(tree, id, &attribute.declarations);
    }
    let body = LightningStyleSheet::parse(block, ParserOptions::default())
        .map_err(|e: LcssError<ParserError<'_>>| Error::Parse(e.to_string()))?;
    append_rules(tree, id, &body.rules)
}

/// Helper to copy a single StyleRule's selectors, declarations and nested rules.
fn append_style_rule(tree: &mut CssTree, parent: NodeId, style_rule: &StyleRule<'_>) -> Result<()> {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        selectors_vec.push(css_string(selector)?);
    }

    let id = tree.append_rule(parent, selectors_vec.join(", "));
    append_declarations(tree, id, &style_rule.declarations)?;
    append_rules(tree, id, &style_rule.rules)
}

fn append_keyframes(
    tree: &mut CssTree,
    parent: NodeId,
    keyframes_rule: &KeyframesRule<'_>,
) -> Result<()> {
    let name = format!("{}keyframes", prefix_str(keyframes_rule.vendor_prefix));
    let id = tree.append_at_rule(parent, name, css_string(&keyframes_rule.name)?);

    for keyframe in &keyframes_rule.keyframes {
        let mut selectors_vec = Vec::new();
        for selector in &keyframe.selectors {
            selectors_vec.push(css_string(selector)?);
        }
        let frame = tree.append_rule(id, selectors_vec.join(", "));
        append_declarations(tree, frame, &keyframe.declarations)?;
    }
    Ok(())
}

/// Normal declarations first, then the `!important` ones, as LightningCSS
/// stores them.
fn append_declarations(
    tree: &mut CssTree,
    parent: NodeId,
    block: &DeclarationBlock<'_>,
) -> Result<()> {
    for property in &block.declarations {
        append_property(tree, parent, property, false)?;
    }
    for property in &block.important_declarations {
        append_property(tree, parent, property, true)?;
    }
    Ok(())
}

fn append_property(
    tree: &mut CssTree,
    parent: NodeId,
    property: &Property<'_>,
    important: bool,
) -> Result<()> {
    let property_id = property.property_id();
    let property_name = format!("{}{}", prefix_str(property_id.prefix()), property_id.name());
    let property_value = property
        .value_to_css_string(PrinterOptions::default())
        .map_err(|e| Error::Parse(e.to_string()))?;
    tree.append_declaration(parent, property_name, property_value, important);
    Ok(())
}

fn css_string<T: ToCss>(value: &T) -> Result<String> {
    value
        .to_css_string(PrinterOptions::default())
        .map_err(|e| Error::Parse(e.to_string()))
}

fn css_strings<T: ToCss>(values: &[T]) -> Result<Vec<String>> {
    values.iter().map(css_string).collect()
}

fn prefix_str(prefix: VendorPrefix) -> &'static str {
    if prefix.contains(VendorPrefix::WebKit) {
        "-webkit-"
    } else if prefix.contains(VendorPrefix::Moz) {
        "-moz-"
    } else if prefix.contains(VendorPrefix::Ms) {
        "-ms-"
    } else if prefix.contains(VendorPrefix::O) {
        "-o-"
    } else {
        ""
    }
}
