//! The deployment context: plain string values supplied from outside at
//! synthesis time.
//!
//! Values are layered, later layers win:
//! 1. the `"context"` section of the project file (`cdk.json`)
//! 2. an optional `.env` style file
//! 3. `-c key=value` arguments

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SynthError};

pub const DEFAULT_PROJECT_FILE: &str = "cdk.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentContext {
    values: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    context: serde_json::Map<String, Value>,
}

impl DeploymentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// like [`DeploymentContext::get`] but an absent or empty value is an error.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim()),
            _ => Err(SynthError::MissingContextValue(key.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// values from `other` replace values already present.
    pub fn merge(&mut self, other: DeploymentContext) {
        self.values.extend(other.values);
    }

    /// parses `key=value` arguments. The value may itself contain `=`.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    out.insert(key.trim(), value.trim());
                }
                _ => return Err(SynthError::InvalidContextArg(arg.to_string())),
            }
        }
        Ok(out)
    }

    /// reads the `"context"` object of a project file. A project file that
    /// does not exist contributes nothing. Strings, numbers and booleans are
    /// taken as strings; nested values are ignored.
    pub fn from_project_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no project file");
                return Ok(Self::new());
            }
            Err(source) => return Err(SynthError::Read { path: path.to_path_buf(), source }),
        };
        let project: ProjectFile = serde_json::from_str(&contents).map_err(|source| SynthError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let mut out = Self::new();
        for (key, value) in project.context {
            match value {
                Value::String(s) => out.insert(key, s),
                Value::Number(n) => out.insert(key, n.to_string()),
                Value::Bool(b) => out.insert(key, b.to_string()),
                other => debug!(%key, value = %other, "ignoring non-scalar context value"),
            }
        }
        debug!(path = %path.display(), values = out.len(), "loaded project context");
        Ok(out)
    }

    /// reads `KEY=VALUE` lines. Blank lines and lines starting with `#` are
    /// skipped, and one pair of surrounding quotes is removed from values.
    /// A `#` after a value is part of the value, not a comment.
    pub fn from_dotenv_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SynthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let out = Self::from_dotenv_str(&contents);
        debug!(path = %path.display(), values = out.len(), "loaded env file");
        Ok(out)
    }

    pub fn from_dotenv_str(contents: &str) -> Self {
        let mut out = Self::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, val)) = line.split_once('=') {
                out.insert(key.trim(), unquote(val.trim()));
            }
        }
        out
    }
}

fn unquote(val: &str) -> &str {
    for quote in ['"', '\''] {
        if val.len() >= 2 && val.starts_with(quote) && val.ends_with(quote) {
            return &val[1..val.len() - 1];
        }
    }
    val
}
