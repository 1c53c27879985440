//! Building a [`CssTree`](crate::tree::CssTree) from CSS text.

mod convert;
mod tokens;

pub use convert::parse_tree;
