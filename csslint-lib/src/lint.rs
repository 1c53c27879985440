//! Lint engines.
//!
//! [`LintEngine`] is the seam to the rule-checking backend. The bundled
//! [`LightningEngine`] lints with LightningCSS: every parse error it recovers
//! from becomes a warning and the re-printed stylesheet is the autofixed code.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use lightningcss::error::{Error as LcssError, ParserError};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::parser::html::extract_style_blocks;

/// Turns printer minification on or off.
pub const RULE_MINIFY: &str = "minify";
/// Recover from invalid rules and report them as warnings (on by default).
pub const RULE_ERROR_RECOVERY: &str = "error-recovery";

pub const SYNTAX_ERROR_RULE: &str = "css-syntax-error";
pub const INVALID_OPTION_RULE: &str = "invalid-option";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Css,
    Html,
}

impl Syntax {
    pub const ALL: [Syntax; 2] = [Syntax::Css, Syntax::Html];

    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Css => "css",
            Syntax::Html => "html",
        }
    }

    /// `.html`, `.htm` and `.vue` files are HTML, everything else is CSS.
    pub fn from_path(path: &Path) -> Syntax {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext)
                if ["html", "htm", "vue"]
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
            {
                Syntax::Html
            }
            _ => Syntax::Css,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Syntax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Syntax::ALL
            .into_iter()
            .find(|syntax| syntax.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unsupported syntax `{}`; available syntaxes: css, html",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One problem reported by an engine. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub rule: String,
    pub severity: Severity,
    pub text: String,
}

impl Warning {
    fn invalid_option(text: String) -> Self {
        Warning {
            line: None,
            column: None,
            rule: INVALID_OPTION_RULE.to_string(),
            severity: Severity::Warning,
            text,
        }
    }

    fn from_parser_warning(err: &LcssError<ParserError<'_>>) -> Self {
        Warning {
            line: err.loc.as_ref().map(|loc| loc.line + 1),
            column: err.loc.as_ref().map(|loc| loc.column),
            rule: SYNTAX_ERROR_RULE.to_string(),
            severity: Severity::Warning,
            text: err.kind.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(
                f,
                "{}:{}: {}: {} ({})",
                line, column, severity, self.text, self.rule
            ),
            (Some(line), None) => {
                write!(f, "{}: {}: {} ({})", line, severity, self.text, self.rule)
            }
            _ => write!(f, "{}: {} ({})", severity, self.text, self.rule),
        }
    }
}

/// What an engine hands back for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintReport {
    pub warnings: Vec<Warning>,
    /// Autofixed source, same syntax as the input.
    pub output: String,
    /// Names of the rules that were recognised and applied.
    pub applied_rules: Vec<String>,
}

/// A rule-checking backend.
///
/// Engines are shared across the batch worker pool, hence `Send + Sync`.
pub trait LintEngine: Send + Sync {
    /// Short identifier echoed in the response, e.g. `lightningcss`.
    fn name(&self) -> &'static str;

    /// Version of the underlying linter.
    fn version(&self) -> &'static str;

    /// Lints one document.
    ///
    /// # Arguments
    ///
    /// * `code` - The source text.
    /// * `syntax` - Whether `code` is a stylesheet or an HTML document.
    /// * `rules` - Rule name to setting, as sent in the request.
    ///
    /// # Returns
    ///
    /// Warnings, autofixed output and the applied rules. A document the
    /// engine cannot process at all is an [`Error::Lint`].
    fn lint(&self, code: &str, syntax: Syntax, rules: &Map<String, Value>) -> Result<LintReport>;
}

/// Settings the LightningCSS engine derives from a rule map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub minify: bool,
    pub error_recovery: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            minify: false,
            error_recovery: true,
        }
    }
}

impl EngineOptions {
    /// Unknown rules and malformed values are reported, never fatal.
    pub fn from_rules(rules: &Map<String, Value>) -> (Self, Vec<String>, Vec<Warning>) {
        let mut options = EngineOptions::default();
        let mut applied = Vec::new();
        let mut warnings = Vec::new();

        for (name, value) in rules {
            let slot = match name.as_str() {
                RULE_MINIFY => &mut options.minify,
                RULE_ERROR_RECOVERY => &mut options.error_recovery,
                _ => {
                    warnings.push(Warning::invalid_option(format!("Unknown rule {}.", name)));
                    continue;
                }
            };
            match value {
                Value::Bool(enabled) => *slot = *enabled,
                // null switches a rule off
                Value::Null => *slot = false,
                other => {
                    warnings.push(Warning::invalid_option(format!(
                        "Invalid option value {} for rule \"{}\"",
                        other, name
                    )));
                    continue;
                }
            }
            applied.push(name.clone());
        }

        (options, applied, warnings)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LightningEngine;

/// Version of the pinned `lightningcss` dependency.
const LIGHTNINGCSS_VERSION: &str = "1.0.0-alpha.63";

impl LintEngine for LightningEngine {
    fn name(&self) -> &'static str {
        "lightningcss"
    }

    fn version(&self) -> &'static str {
        LIGHTNINGCSS_VERSION
    }

    fn lint(&self, code: &str, syntax: Syntax, rules: &Map<String, Value>) -> Result<LintReport> {
        let (options, applied_rules, mut warnings) = EngineOptions::from_rules(rules);
        debug!("linting {} bytes of {} with {:?}", code.len(), syntax, options);

        let (found, output) = match syntax {
            Syntax::Css => lint_css(code, options)?,
            Syntax::Html => lint_html(code, options)?,
        };
        warnings.extend(found);

        Ok(LintReport {
            warnings,
            output,
            applied_rules,
        })
    }
}

/// Parses and re-prints one stylesheet.
///
/// # Arguments
///
/// * `code` - The stylesheet text.
/// * `options` - Printer and recovery settings.
///
/// # Returns
///
/// The recovered parse errors as warnings, relative to `code`, and the
/// printed stylesheet.
fn lint_css(code: &str, options: EngineOptions) -> Result<(Vec<Warning>, String)> {
    let recovered = Arc::new(RwLock::new(Vec::new()));
    let parser_options = ParserOptions {
        error_recovery: options.error_recovery,
        warnings: Some(Arc::clone(&recovered)),
        ..ParserOptions::default()
    };

    let sheet = StyleSheet::parse(code, parser_options)
        .map_err(|e: LcssError<ParserError<'_>>| Error::Lint(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: options.minify,
            ..PrinterOptions::default()
        })
        .map_err(|e| Error::Lint(e.to_string()))?;

    let warnings = match recovered.read() {
        Ok(list) => list.iter().map(Warning::from_parser_warning).collect(),
        Err(_) => {
            warn!("parser warning list was poisoned, dropping it");
            Vec::new()
        }
    };
    Ok((warnings, printed.code))
}

/// Lints every `<style>` block and splices the fixed CSS back in place.
///
/// # Arguments
///
/// * `code` - The HTML document.
/// * `options` - Passed on to [`lint_css`] for each block.
///
/// # Returns
///
/// Warnings with document positions, and the document with each block's
/// contents replaced by its printed form. Markup outside the blocks is
/// copied byte for byte.
fn lint_html(code: &str, options: EngineOptions) -> Result<(Vec<Warning>, String)> {
    let lowered = code.to_ascii_lowercase();
    let mut warnings = Vec::new();
    let mut output = String::with_capacity(code.len());
    let mut cursor = 0;

    for css in extract_style_blocks(code) {
        if css.trim().is_empty() {
            continue;
        }

        let Some((start, end)) = locate_style_block(code, &lowered, cursor, &css) else {
            warn!("style block not found in the document, leaving it unchanged");
            let (mut found, _) = lint_css(&css, options)?;
            for warning in found.iter_mut() {
                warning.line = None;
                warning.column = None;
            }
            warnings.extend(found);
            continue;
        };

        let source = &code[start..end];
        let (mut found, fixed) = lint_css(source, options)?;
        shift_to_document(&mut found, code, start);

        let lead = &source[..source.len() - source.trim_start().len()];
        let trail = &source[source.trim_end().len()..];
        debug!("replacing style block of {} bytes at offset {}", source.len(), start);

        output.push_str(&code[cursor..start]);
        output.push_str(lead);
        output.push_str(fixed.trim());
        output.push_str(trail);
        cursor = end;
        warnings.extend(found);
    }

    output.push_str(&code[cursor..]);
    Ok((warnings, output))
}

/// Finds the byte range of the first `<style>` element body at or after
/// `from` whose text is `css`.
///
/// html5ever hands over the text with `\r\n` and `\r` turned into `\n`, so
/// the comparison is made on the normalised source. `lowered` is the ASCII
/// lowercase copy of `code`, byte offsets are shared.
fn locate_style_block(code: &str, lowered: &str, from: usize, css: &str) -> Option<(usize, usize)> {
    const OPEN: &str = "<style";
    const CLOSE: &str = "</style";

    let mut search = from;
    while let Some(relative) = lowered[search..].find(OPEN) {
        let name_end = search + relative + OPEN.len();
        search = name_end;
        match lowered.as_bytes().get(name_end).copied() {
            Some(b'>') | Some(b'/') => {}
            Some(byte) if byte.is_ascii_whitespace() => {}
            // `<styles>` or similar
            _ => continue,
        }

        let start = name_end + lowered[name_end..].find('>')? + 1;
        let end = lowered[start..]
            .find(CLOSE)
            .map_or(code.len(), |relative| start + relative);
        if normalize_newlines(&code[start..end]) == css {
            return Some((start, end));
        }
        search = start;
    }
    None
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Moves block-relative positions to document positions.
fn shift_to_document(warnings: &mut [Warning], code: &str, offset: usize) {
    let before = &code[..offset];
    let block_line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let block_column = (offset - line_start) as u32;

    for warning in warnings.iter_mut() {
        if let Some(line) = warning.line {
            if line == 1 {
                warning.column = warning.column.map(|column| column + block_column);
            }
            warning.line = Some(line + block_line);
        }
    }
}
