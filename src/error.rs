use std::path::PathBuf;

use thiserror::Error;

use crate::lookup::MissingContext;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Missing required context value '{0}'. Provide it with `-c {0}=<value>` or in the \"context\" section of cdk.json")]
    MissingContextValue(String),

    #[error("Invalid context argument {0:?}. Expected the form key=value")]
    InvalidContextArg(String),

    #[error("Invalid region code {region:?}\nMust be one of {valid:?}")]
    InvalidRegion { region: String, valid: &'static [&'static str] },

    #[error("Invalid stack name {name}\nMust only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.")]
    InvalidStackName { name: String },

    #[error("Invalid logical id {0:?}\nMust contain only alphanumeric characters [A-Za-z0-9] and be between 1 and 255 characters")]
    InvalidLogicalId(String),

    #[error("Validation failed on resource '{logical_id}'\n{reason}")]
    InvalidResource { logical_id: String, reason: String },

    #[error("Resource '{0}' was declared more than once")]
    DuplicateLogicalId(String),

    #[error("'{from}' references '{to}', which has not been declared yet")]
    UndeclaredReference { from: String, to: String },

    #[error("Cached context value for '{key}' is malformed: {reason}")]
    MalformedContextValue { key: String, reason: String },

    #[error("{} context lookup(s) could not be resolved:\n{}", .0.len(), format_missing(.0))]
    MissingLookups(Vec<MissingContext>),

    #[error("Failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize template")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "aws-lookup")]
    #[error("Lookup of '{key}' failed\n{message}")]
    Lookup { key: String, message: String },

    #[cfg(feature = "aws-lookup")]
    #[error("Failed to start the async runtime")]
    Runtime(#[source] std::io::Error),
}

fn format_missing(missing: &[MissingContext]) -> String {
    missing
        .iter()
        .map(|m| format!("  - {}", m.key))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T, E = SynthError> = std::result::Result<T, E>;
