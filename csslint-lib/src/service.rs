//! Request pipeline: validate, lint, format, wrap in an envelope.

use log::{debug, error};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::format::{format, OutputStyle};
use crate::lint::{LintEngine, Syntax, Warning};
use crate::style::parse_tree;

/// Message of every successful response.
pub const SUCCESS_MESSAGE: &str = "success";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub syntax: String,
    #[serde(default)]
    pub config: RequestConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// Must be a non-empty JSON object.
    #[serde(default)]
    pub rules: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_style: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRequest<'a> {
    pub code: &'a str,
    pub syntax: Syntax,
    pub rules: &'a Map<String, Value>,
    pub output_style: Option<OutputStyle>,
}

impl LintRequest {
    pub fn validate(&self) -> Result<ValidRequest<'_>> {
        if self.code.trim().is_empty() {
            return Err(Error::Validation("CSS code is empty".to_string()));
        }
        let syntax: Syntax = self.syntax.parse()?;
        let rules = match &self.config.rules {
            Value::Object(rules) => rules,
            _ => return Err(Error::Validation("lint rules must be an object".to_string())),
        };
        if rules.is_empty() {
            return Err(Error::Validation(
                "at least one lint rule is required".to_string(),
            ));
        }
        let output_style = self
            .config
            .output_style
            .as_deref()
            .map(str::parse::<OutputStyle>)
            .transpose()?;

        Ok(ValidRequest {
            code: &self.code,
            syntax,
            rules,
            output_style,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintResponse {
    pub success: bool,
    pub message: String,
    pub content: Option<LintContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintContent {
    pub warnings: Vec<Warning>,
    pub output: String,
    pub info: LintInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintInfo {
    /// Version of the lint engine.
    pub version: String,
    pub config: InfoConfig,
}

/// Effective configuration, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoConfig {
    pub engine: String,
    pub syntax: Syntax,
    pub rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_style: Option<OutputStyle>,
}

impl LintResponse {
    pub fn failure(err: &Error) -> Self {
        LintResponse {
            success: false,
            message: err.to_string(),
            content: None,
        }
    }
}

/// Runs one request through `engine`. Any failure is returned as an error.
pub fn lint_code<E: LintEngine + ?Sized>(
    engine: &E,
    request: &LintRequest,
) -> Result<LintResponse> {
    let valid = request.validate()?;
    debug!(
        "request: {} bytes of {}, style {:?}",
        valid.code.len(),
        valid.syntax,
        valid.output_style
    );

    let report = engine.lint(valid.code, valid.syntax, valid.rules)?;
    let linted = if report.output.is_empty() {
        valid.code
    } else {
        report.output.as_str()
    };
    let output = format_output(linted, valid.output_style, valid.syntax)?;

    Ok(LintResponse {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
        content: Some(LintContent {
            warnings: report.warnings,
            output,
            info: LintInfo {
                version: engine.version().to_string(),
                config: InfoConfig {
                    engine: engine.name().to_string(),
                    syntax: valid.syntax,
                    rules: report.applied_rules,
                    output_style: valid.output_style,
                },
            },
        }),
    })
}

/// Re-serializes CSS in the requested style. HTML, or no style, passes through.
pub fn format_output(linted: &str, style: Option<OutputStyle>, syntax: Syntax) -> Result<String> {
    match (style, syntax) {
        (Some(style), Syntax::Css) => {
            let tree = parse_tree(linted)?;
            Ok(format(&tree, style)?)
        }
        _ => Ok(linted.to_string()),
    }
}

/// Like [`lint_code`], but failures become an unsuccessful envelope.
pub fn handle<E: LintEngine + ?Sized>(engine: &E, request: &LintRequest) -> LintResponse {
    match lint_code(engine, request) {
        Ok(response) => response,
        Err(err) => {
            error!("[{}] {}", err.code(), err);
            LintResponse::failure(&err)
        }
    }
}

/// Handles independent requests in parallel. Responses keep the input order.
pub fn handle_batch<E: LintEngine + ?Sized>(
    engine: &E,
    requests: &[LintRequest],
) -> Vec<LintResponse> {
    requests
        .par_iter()
        .map(|request| handle(engine, request))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{LintReport, Severity};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Echoes its input and flags every `!important`.
    struct EchoEngine;

    impl LintEngine for EchoEngine {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn version(&self) -> &'static str {
            "0.0.1"
        }

        fn lint(
            &self,
            code: &str,
            _syntax: Syntax,
            rules: &Map<String, Value>,
        ) -> Result<LintReport> {
            let warnings = code
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains("!important"))
                .map(|(i, _)| Warning {
                    line: Some(i as u32 + 1),
                    column: None,
                    rule: "declaration-no-important".into(),
                    severity: Severity::Error,
                    text: "Unexpected !important".into(),
                })
                .collect();
            Ok(LintReport {
                warnings,
                output: String::new(),
                applied_rules: rules.keys().cloned().collect(),
            })
        }
    }

    fn request(code: &str, syntax: &str, rules: Value, style: Option<&str>) -> LintRequest {
        LintRequest {
            code: code.to_string(),
            syntax: syntax.to_string(),
            config: RequestConfig {
                rules,
                output_style: style.map(str::to_string),
            },
        }
    }

    fn validation_message(req: &LintRequest) -> String {
        match req.validate() {
            Err(Error::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_messages() {
        let rules = json!({ "minify": false });
        assert_eq!(
            validation_message(&request("  ", "css", rules.clone(), None)),
            "CSS code is empty"
        );
        assert_eq!(
            validation_message(&request("a{}", "scss", rules.clone(), None)),
            "unsupported syntax `scss`; available syntaxes: css, html"
        );
        assert_eq!(
            validation_message(&request("a{}", "css", json!(["minify"]), None)),
            "lint rules must be an object"
        );
        assert_eq!(
            validation_message(&request("a{}", "css", json!({}), None)),
            "at least one lint rule is required"
        );
        assert_eq!(
            validation_message(&request("a{}", "css", rules, Some("expanded"))),
            "unsupported output style `expanded`; available styles: compact, nested"
        );
    }

    #[test]
    fn test_empty_engine_output_falls_back_to_code() {
        let req = request(
            "a { color: red !important; }",
            "css",
            json!({ "declaration-no-important": true }),
            Some("compact"),
        );
        let response = lint_code(&EchoEngine, &req).unwrap();
        let content = response.content.unwrap();
        assert_eq!(content.output, "a { color: red !important; }");
        assert_eq!(content.warnings.len(), 1);
        assert_eq!(content.info.version, "0.0.1");
        assert_eq!(content.info.config.engine, "echo");
        assert_eq!(content.info.config.rules, vec!["declaration-no-important"]);
    }

    #[test]
    fn test_html_bypasses_formatter() {
        let html = "<style>a{color:red}</style>";
        let req = request(html, "html", json!({ "x": 1 }), Some("nested"));
        let response = lint_code(&EchoEngine, &req).unwrap();
        assert_eq!(response.content.unwrap().output, html);
    }

    #[test]
    fn test_handle_turns_errors_into_failure_envelope() {
        let response = handle(&EchoEngine, &request("", "css", json!({ "x": 1 }), None));
        assert!(!response.success);
        assert_eq!(response.message, "CSS code is empty");
        assert_eq!(response.content, None);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": false, "message": "CSS code is empty", "content": null })
        );
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let req: LintRequest = serde_json::from_value(json!({
            "code": "a{}",
            "syntax": "css",
            "config": { "rules": { "minify": true }, "outputStyle": "nested" }
        }))
        .unwrap();
        assert_eq!(req.config.output_style.as_deref(), Some("nested"));
        let valid = req.validate().unwrap();
        assert_eq!(valid.output_style, Some(OutputStyle::Nested));
    }

    #[test]
    fn test_batch_keeps_order() {
        let requests = vec![
            request("a{}", "css", json!({ "x": 1 }), None),
            request("", "css", json!({ "x": 1 }), None),
            request("b{}", "css", json!({ "x": 1 }), None),
        ];
        let responses = handle_batch(&EchoEngine, &requests);
        let flags: Vec<bool> = responses.iter().map(|r| r.success).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(responses[2].content.as_ref().unwrap().output, "b{}");
    }
}
