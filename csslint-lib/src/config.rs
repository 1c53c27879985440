//! Lint configuration shared by the CLI and config files.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::service::{LintRequest, RequestConfig};

/// Contents of a `--config` JSON file: `{ "rules": {...}, "outputStyle": "nested" }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LintConfig {
    #[serde(default)]
    pub rules: Map<String, Value>,
    #[serde(default)]
    pub output_style: Option<String>,
}

impl LintConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies a `name=value` override. The value is read as JSON when it
    /// parses (`true`, `null`, `[1, 2]`) and as a plain string otherwise.
    pub fn set_rule(&mut self, assignment: &str) -> Result<()> {
        let (name, raw) = assignment.split_once('=').ok_or_else(|| {
            Error::Config(format!("expected `name=value`, got `{}`", assignment))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Config(format!("missing rule name in `{}`", assignment)));
        }
        let raw = raw.trim();
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.rules.insert(name.to_string(), value);
        Ok(())
    }

    /// An explicit style wins over the configured one.
    pub fn into_request(self, code: String, syntax: &str, style: Option<String>) -> LintRequest {
        LintRequest {
            code,
            syntax: syntax.to_string(),
            config: RequestConfig {
                rules: Value::Object(self.rules),
                output_style: style.or(self.output_style),
            },
        }
    }
}
