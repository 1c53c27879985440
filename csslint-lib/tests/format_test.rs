use csslint_lib::format::{format, OutputStyle};
use csslint_lib::style::parse_tree;
use csslint_lib::tree::CssTree;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Rules `r0..rN`, each with its own unique declarations, followed by a
/// keyframes block with one frame per percentage.
fn build_sheet(decl_counts: &[usize], frames: &[u8]) -> CssTree {
    let mut tree = CssTree::new();
    let root = tree.root();
    for (r, &count) in decl_counts.iter().enumerate() {
        let rule = tree.append_rule(root, format!(".r{}", r));
        for d in 0..count {
            tree.append_declaration(rule, format!("x{}d{}", r, d), format!("v{}", d), false);
        }
    }
    if !frames.is_empty() {
        let keyframes = tree.append_at_rule(root, "keyframes", "spin");
        for &pct in frames {
            let frame = tree.append_rule(keyframes, format!("{}%", pct));
            tree.append_declaration(frame, "opacity", "1", false);
        }
    }
    tree
}

fn lines_starting_with(out: &str, head: &str) -> usize {
    out.lines().filter(|line| line.trim_start().starts_with(head)).count()
}

fn frame_set() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::btree_set(0u8..=100, 0..6).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_keyframe_selectors_are_printed_once(frames in frame_set()) {
        let tree = build_sheet(&[1], &frames);
        for style in OutputStyle::ALL {
            let out = format(&tree, style).unwrap();
            for pct in &frames {
                prop_assert_eq!(lines_starting_with(&out, &format!("{}% {{", pct)), 1);
            }
        }
    }

    #[test]
    fn prop_every_declaration_appears_once(
        counts in prop::collection::vec(0usize..5, 1..6),
        frames in frame_set(),
    ) {
        let tree = build_sheet(&counts, &frames);
        for style in OutputStyle::ALL {
            let out = format(&tree, style).unwrap();
            for (r, &count) in counts.iter().enumerate() {
                for d in 0..count {
                    let needle = format!("x{}d{}: v{};", r, d, d);
                    prop_assert_eq!(out.matches(needle.as_str()).count(), 1);
                }
            }
        }
    }

    #[test]
    fn prop_nested_indent_is_two_spaces_per_depth(depth in 1usize..8, in_media in any::<bool>()) {
        let mut tree = CssTree::new();
        let mut parent = tree.root();
        if in_media {
            parent = tree.append_at_rule(parent, "media", "print");
        }
        for level in 0..depth {
            parent = tree.append_rule(parent, format!(".l{}", level));
            tree.append_declaration(parent, format!("p{}", level), "0", false);
        }

        let out = format(&tree, OutputStyle::Nested).unwrap();
        let offset = usize::from(in_media);
        for level in 0..depth {
            let line = format!("{}p{}: 0;", "  ".repeat(level + 1 + offset), level);
            prop_assert!(out.lines().any(|l| l == line), "missing `{}` in\n{}", line, out);
        }
    }
}

const SAMPLES: &[&str] = &[
    "body { color: red; margin: 0; }",
    "@charset \"UTF-8\";\n/*! Main styles */\nbody { color: red; }",
    "@media screen and (max-width: 600px) { body { font-size: 14px; } .a, .b { padding: 4px; } }",
    "@keyframes fade { from { opacity: 0; } 50% { opacity: 0.5; } to { opacity: 1; } }",
    "@font-face { font-family: Foo; src: url(foo.woff); }\nh1 { font-weight: bold !important; }",
    "@supports (display: grid) { .grid { display: grid; } }",
    "@import url(\"base.css\") screen;\n@page :first { margin: 1in; }",
    "@container sidebar (width > 400px) { .card { color: red; } }",
];

#[test]
fn test_nested_output_is_idempotent() {
    for sample in SAMPLES {
        let first = format(&parse_tree(sample).unwrap(), OutputStyle::Nested).unwrap();
        let second = format(&parse_tree(&first).unwrap(), OutputStyle::Nested).unwrap();
        assert_eq!(first, second, "sample: {}", sample);
    }
}

#[test]
fn test_compact_output_reparses_to_same_nested_output() {
    for sample in SAMPLES {
        let tree = parse_tree(sample).unwrap();
        let compact = format(&tree, OutputStyle::Compact).unwrap();
        let nested = format(&tree, OutputStyle::Nested).unwrap();
        let via_compact = format(&parse_tree(&compact).unwrap(), OutputStyle::Nested).unwrap();
        assert_eq!(nested, via_compact, "sample: {}", sample);
    }
}

#[test]
fn test_parsed_keyframes_not_duplicated() {
    let tree =
        parse_tree("@keyframes fade { 0% { opacity: 0; } 100% { opacity: 1; } }").unwrap();
    let out = format(&tree, OutputStyle::Compact).unwrap();
    assert_eq!(out.matches("  0% {").count(), 1);
    assert_eq!(out.matches("100% {").count(), 1);
    assert!(out.starts_with("@keyframes fade {\n"));
    assert!(out.ends_with('}'));
}
