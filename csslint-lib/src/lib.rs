pub mod config;
pub mod error;
pub mod format;
pub mod lint;
pub mod parser;
pub mod service;
pub mod style;
pub mod tree;

pub use error::{Error, FormatError, Result};
pub use format::{format, OutputStyle};
pub use lint::{LightningEngine, LintEngine, Syntax, Warning};
pub use service::{handle, handle_batch, lint_code, LintRequest, LintResponse};
pub use tree::{CssTree, NodeId, NodeKind};
